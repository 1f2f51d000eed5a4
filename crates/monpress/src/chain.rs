//! Chained request handlers.
//!
//! A [`Chain`] is an ordered list of [`Step`]s that ends with exactly one
//! base handler.  Each step receives the request [`Context`] and a [`Next`]
//! continuation.  Calling [`Next::proceed`] lets the chain advance; returning
//! an error stops it with a [`ChainError`]; returning [`Flow::halt`] stops it
//! quietly, after the step has written a response.
//!
//! ```rust
//! use monpress::{handler, sync, Context, Outcome};
//!
//! # #[tokio::main] async fn main() {
//! let chain = handler(sync(|ctx: &mut Context, next| {
//!     ctx.respond("hello");
//!     next.proceed()
//! }))
//! .middleware(sync(|_ctx: &mut Context, next| next.proceed()))
//! .finalize();
//!
//! let mut ctx = Context::default();
//! assert_eq!(chain.execute(&mut ctx).await.unwrap(), Outcome::Completed);
//! assert!(ctx.has_response());
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::trace;

use crate::context::Context;
use crate::error::ChainError;

/// What a step returns: how the chain should carry on, or why it failed.
pub type StepResult = Result<Flow, anyhow::Error>;

/// Flow control signal returned by a successful step.
///
/// The only way to obtain a continuing flow is [`Next::proceed`], so a step
/// cannot advance the chain without being handed its continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flow(FlowKind);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlowKind {
    Continue,
    Halt,
}

impl Flow {
    /// Stop the chain without error.  The step is expected to have set a
    /// response on the context.
    pub fn halt() -> Self {
        Flow(FlowKind::Halt)
    }

    pub fn is_continue(&self) -> bool {
        self.0 == FlowKind::Continue
    }
}

/// The continuation handed to every step.
#[derive(Debug)]
pub struct Next {
    _private: (),
}

impl Next {
    fn new() -> Self {
        Next { _private: () }
    }

    /// Advance to the following step.
    pub fn proceed(self) -> StepResult {
        Ok(Flow(FlowKind::Continue))
    }

    /// Stop the chain with `error`.  Equivalent to returning `Err(error)`.
    pub fn fail(self, error: impl Into<anyhow::Error>) -> StepResult {
        Err(error.into())
    }
}

/// One unit of request handling; middleware and base handlers alike.
#[async_trait]
pub trait Step: Send + Sync + 'static {
    async fn apply(&self, ctx: &mut Context, next: Next) -> StepResult;
}

/// Wraps a synchronous function as a step.
///
/// The function runs on the request task, so it must not block.
pub fn sync<F>(func: F) -> SyncStep<F>
where
    F: Fn(&mut Context, Next) -> StepResult + Send + Sync + 'static,
{
    SyncStep(func)
}

/// Wraps a function returning a boxed future as a step.
///
/// ```rust
/// use monpress::{step, Context};
///
/// let auth = step(|ctx: &mut Context, next| {
///     Box::pin(async move {
///         if ctx.header("authorization").is_some() {
///             next.proceed()
///         } else {
///             next.fail(monpress::HttpError::unauthorized("missing token"))
///         }
///     })
/// });
/// # let _ = auth;
/// ```
pub fn step<F>(func: F) -> FnStep<F>
where
    F: for<'a> Fn(&'a mut Context, Next) -> BoxFuture<'a, StepResult> + Send + Sync + 'static,
{
    FnStep(func)
}

pub struct SyncStep<F>(F);

#[async_trait]
impl<F> Step for SyncStep<F>
where
    F: Fn(&mut Context, Next) -> StepResult + Send + Sync + 'static,
{
    async fn apply(&self, ctx: &mut Context, next: Next) -> StepResult {
        (self.0)(ctx, next)
    }
}

impl<F> fmt::Debug for SyncStep<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SyncStep")
            .field(&std::any::type_name::<F>())
            .finish()
    }
}

pub struct FnStep<F>(F);

#[async_trait]
impl<F> Step for FnStep<F>
where
    F: for<'a> Fn(&'a mut Context, Next) -> BoxFuture<'a, StepResult> + Send + Sync + 'static,
{
    async fn apply(&self, ctx: &mut Context, next: Next) -> StepResult {
        (self.0)(ctx, next).await
    }
}

impl<F> fmt::Debug for FnStep<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FnStep")
            .field(&std::any::type_name::<F>())
            .finish()
    }
}

/// How a chain finished when no step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The base handler ran.
    Completed,
    /// The step at `at` returned [`Flow::halt`].
    Halted { at: usize },
}

/// Builds a [`Chain`] around a base handler.
///
/// Middleware runs in the order it is added, before the base handler.
pub struct ChainBuilder {
    base: Arc<dyn Step>,
    middleware: Vec<Arc<dyn Step>>,
}

/// Shorter name for building a chain from its base handler.
pub type Handler = ChainBuilder;

impl ChainBuilder {
    pub fn new(base: impl Step) -> Self {
        ChainBuilder {
            base: Arc::new(base),
            middleware: Vec::new(),
        }
    }

    /// Appends a middleware step.
    pub fn middleware(mut self, step: impl Step) -> Self {
        self.middleware.push(Arc::new(step));
        self
    }

    /// Freezes the chain.  The result can be cloned freely but not changed.
    pub fn finalize(self) -> Chain {
        let mut steps = self.middleware;
        steps.push(self.base);
        Chain {
            steps: steps.into(),
        }
    }
}

impl fmt::Debug for ChainBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainBuilder")
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}

/// Starts a chain whose base handler is `base`.
pub fn handler(base: impl Step) -> ChainBuilder {
    ChainBuilder::new(base)
}

/// An immutable sequence of steps ending with a base handler.
#[derive(Clone)]
pub struct Chain {
    // Never empty: the base handler is always last.
    steps: Arc<[Arc<dyn Step>]>,
}

impl Chain {
    /// Number of steps, base handler included.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns a new chain with `steps` running before this chain's own.
    pub fn prepend(&self, steps: &[Arc<dyn Step>]) -> Chain {
        if steps.is_empty() {
            return self.clone();
        }
        let combined: Vec<Arc<dyn Step>> = steps.iter().chain(self.steps.iter()).cloned().collect();
        Chain {
            steps: combined.into(),
        }
    }

    /// Runs the steps in order against `ctx`.
    ///
    /// The base handler runs at most once, and once it returns `Ok` the
    /// chain is complete whatever flow it reported.
    pub async fn execute(&self, ctx: &mut Context) -> Result<Outcome, ChainError> {
        let last = self.steps.len() - 1;

        for (index, step) in self.steps.iter().enumerate() {
            trace!(index, path = ctx.path(), "running chain step");

            let flow = step
                .apply(ctx, Next::new())
                .await
                .map_err(|source| ChainError::new(index, source))?;

            if index == last {
                break;
            }
            if !flow.is_continue() {
                trace!(index, "chain halted");
                return Ok(Outcome::Halted { at: index });
            }
        }

        Ok(Outcome::Completed)
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain").field("steps", &self.steps.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpError;
    use axum::http::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn counting_base(calls: Arc<AtomicUsize>) -> impl Step {
        sync(move |ctx: &mut Context, next| {
            calls.fetch_add(1, Ordering::SeqCst);
            ctx.respond(StatusCode::OK);
            next.proceed()
        })
    }

    fn recorder(log: Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> impl Step {
        sync(move |_ctx: &mut Context, next| {
            log.lock().unwrap().push(name);
            next.proceed()
        })
    }

    #[tokio::test]
    async fn test_steps_run_in_append_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let base_log = log.clone();
        let chain = handler(sync(move |_ctx: &mut Context, next| {
            base_log.lock().unwrap().push("base");
            next.proceed()
        }))
        .middleware(recorder(log.clone(), "a"))
        .middleware(recorder(log.clone(), "b"))
        .finalize();

        let outcome = chain.execute(&mut Context::default()).await.unwrap();
        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "base"]);
    }

    #[tokio::test]
    async fn test_error_stops_before_base() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = handler(counting_base(calls.clone()))
            .middleware(sync(|_ctx: &mut Context, next| next.proceed()))
            .middleware(sync(|_ctx: &mut Context, next| {
                next.fail(HttpError::forbidden("nope"))
            }))
            .finalize();

        let err = chain.execute(&mut Context::default()).await.unwrap_err();
        assert_eq!(err.index(), 1);
        let original = err.error().downcast_ref::<HttpError>().unwrap();
        assert_eq!(original.status(), StatusCode::FORBIDDEN);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_question_mark_propagates() {
        let chain = handler(sync(|_ctx: &mut Context, next| {
            let _: u32 = "not a number".parse()?;
            next.proceed()
        }))
        .finalize();

        let err = chain.execute(&mut Context::default()).await.unwrap_err();
        assert_eq!(err.index(), 0);
        assert!(err.error().downcast_ref::<std::num::ParseIntError>().is_some());
    }

    #[tokio::test]
    async fn test_silent_halt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = handler(counting_base(calls.clone()))
            .middleware(sync(|ctx: &mut Context, _next| {
                ctx.respond(StatusCode::NOT_MODIFIED);
                Ok(Flow::halt())
            }))
            .finalize();

        let mut ctx = Context::default();
        let outcome = chain.execute(&mut ctx).await.unwrap();

        assert_eq!(outcome, Outcome::Halted { at: 0 });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(ctx.take_response().unwrap().status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_base_runs_once_and_completes_on_halt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let chain = handler(sync(move |ctx: &mut Context, _next| {
            counter.fetch_add(1, Ordering::SeqCst);
            ctx.respond("done");
            Ok(Flow::halt())
        }))
        .finalize();

        let outcome = chain.execute(&mut Context::default()).await.unwrap();
        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_async_steps_are_awaited() {
        let chain = handler(sync(|ctx: &mut Context, next| {
            let greeting = ctx.param("greeting").unwrap_or("missing").to_string();
            ctx.respond(greeting);
            next.proceed()
        }))
        .middleware(step(|_ctx: &mut Context, next| {
            Box::pin(async move {
                tokio::task::yield_now().await;
                next.proceed()
            })
        }))
        .finalize();

        let mut ctx = Context::default();
        assert_eq!(chain.execute(&mut ctx).await.unwrap(), Outcome::Completed);
        assert!(ctx.has_response());
    }

    #[tokio::test]
    async fn test_prepend_runs_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = handler(recorder(log.clone(), "base"))
            .middleware(recorder(log.clone(), "route"))
            .finalize();
        let global: Vec<Arc<dyn Step>> = vec![Arc::new(recorder(log.clone(), "global"))];

        let combined = chain.prepend(&global);
        assert_eq!(combined.len(), 3);
        assert_eq!(chain.len(), 2);

        combined.execute(&mut Context::default()).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["global", "route", "base"]);
    }

    #[tokio::test]
    async fn test_chain_is_reusable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = handler(counting_base(calls.clone())).finalize();
        let copy = chain.clone();

        chain.execute(&mut Context::default()).await.unwrap();
        copy.execute(&mut Context::default()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
