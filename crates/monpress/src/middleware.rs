//! Built-in middleware.

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::chain::{Next, Step, StepResult};
use crate::context::Context;

/// Logs every incoming request's method and path, except favicon requests.
///
/// Never stops the chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogger;

#[async_trait]
impl Step for RequestLogger {
    async fn apply(&self, ctx: &mut Context, next: Next) -> StepResult {
        if !ctx.path().starts_with("/favicon") {
            info!(
                method = %ctx.method(),
                path = ctx.path(),
                timestamp = %Utc::now().to_rfc3339(),
                "--> incoming request"
            );
        }
        next.proceed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{handler, sync, Outcome};
    use axum::body::Body;

    #[tokio::test]
    async fn test_logger_always_proceeds() {
        let chain = handler(sync(|ctx: &mut Context, next| {
            ctx.respond("ok");
            next.proceed()
        }))
        .middleware(RequestLogger)
        .finalize();

        for uri in ["/", "/favicon.ico"] {
            let request = axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap();
            let mut ctx = Context::from_request(request);
            assert_eq!(chain.execute(&mut ctx).await.unwrap(), Outcome::Completed);
            assert!(ctx.has_response());
        }
    }
}
