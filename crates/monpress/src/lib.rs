//! # Monpress
//!
//! Runtime for file-routed axum applications.
//!
//! Route files export one function per HTTP verb, each returning a chain:
//! a base handler with middleware in front of it.  `monpress generate`
//! collects them into a module whose `router()` fills a [`Routes`]
//! registry, and [`App`] serves it.
//!
//! ```rust
//! use monpress::{handler, sync, ChainBuilder, Context, HttpError};
//!
//! #[allow(non_snake_case)]
//! pub fn GET() -> ChainBuilder {
//!     handler(sync(|ctx: &mut Context, next| {
//!         let id = ctx.param("id").unwrap_or_default().to_string();
//!         ctx.respond(format!("user {}", id));
//!         next.proceed()
//!     }))
//!     .middleware(sync(|ctx: &mut Context, next| match ctx.header("authorization") {
//!         Some(_) => next.proceed(),
//!         None => next.fail(HttpError::unauthorized("login required")),
//!     }))
//! }
//! # let _ = GET();
//! ```

pub mod app;
pub mod chain;
pub mod context;
pub mod error;
pub mod middleware;
pub mod routes;

pub use app::App;
pub use chain::{
    handler, step, sync, Chain, ChainBuilder, Flow, Handler, Next, Outcome, Step, StepResult,
};
pub use context::Context;
pub use error::{ChainError, ErrorKind, HttpError};
pub use middleware::RequestLogger;
pub use routes::{IntoChain, RouteEntry, Routes};

pub use async_trait::async_trait;
pub use axum::http::{Method, StatusCode};
pub use axum::response::{IntoResponse, Response};
pub use axum::Json;
pub use futures::future::BoxFuture;
