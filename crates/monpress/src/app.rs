//! Application bootstrap.

use std::fmt;
use std::sync::Arc;

use axum::Router;
use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::info;

use crate::chain::Step;
use crate::middleware::RequestLogger;
use crate::routes::Routes;

type Configure = Box<dyn FnOnce(Router) -> Router + Send>;

/// A monpress application: generated routes plus global middleware.
///
/// ```rust,no_run
/// use monpress::{handler, sync, App, Context, Routes};
///
/// # #[tokio::main] async fn main() -> std::io::Result<()> {
/// let mut routes = Routes::new();
/// routes.get("/", handler(sync(|ctx: &mut Context, next| {
///     ctx.respond("hello");
///     next.proceed()
/// })));
///
/// App::new(routes).listen("127.0.0.1:3000").await
/// # }
/// ```
pub struct App {
    routes: Routes,
    middleware: Vec<Arc<dyn Step>>,
    configure: Vec<Configure>,
    request_logger: bool,
}

impl App {
    pub fn new(routes: Routes) -> Self {
        App {
            routes,
            middleware: Vec::new(),
            configure: Vec::new(),
            request_logger: true,
        }
    }

    /// Adds a step that runs before every route's own chain.
    pub fn middleware(mut self, step: impl Step) -> Self {
        self.middleware.push(Arc::new(step));
        self
    }

    /// Serves additional routes, registered after the main ones.
    pub fn extra_routes(mut self, routes: Routes) -> Self {
        self.routes.merge(routes);
        self
    }

    /// Applies a raw transformation to the axum router once every route is
    /// mounted, so layers added here wrap all routes.
    pub fn configure<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(Router) -> Router + Send + 'static,
    {
        self.configure.push(Box::new(configure));
        self
    }

    /// Disables the built-in [`RequestLogger`].
    pub fn without_request_logger(mut self) -> Self {
        self.request_logger = false;
        self
    }

    /// Builds the axum router.  Global middleware runs in the order it was
    /// added, followed by the request logger.
    pub fn into_router(self) -> Router {
        let mut global = self.middleware;
        if self.request_logger {
            global.push(Arc::new(RequestLogger));
        }

        let routes = self.routes.len();
        let router = self.routes.into_router(&global);
        info!(routes, middleware = global.len(), "router built");

        self.configure
            .into_iter()
            .fold(router, |router, configure| configure(router))
    }

    /// Binds `addr` and serves until the process stops.
    pub async fn listen(self, addr: impl ToSocketAddrs) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!("monpress listening on http://{}", listener.local_addr()?);
        axum::serve(listener, self.into_router()).await
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("routes", &self.routes.len())
            .field("middleware", &self.middleware.len())
            .field("request_logger", &self.request_logger)
            .finish_non_exhaustive()
    }
}
