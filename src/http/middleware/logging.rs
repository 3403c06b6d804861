//! Request logging middleware.

use std::time::Instant;

use crate::http::handler::Handler;
use crate::http::middleware::Middleware;
use crate::observability::metrics;

/// Logs `[METHOD] "target" duration` once the wrapped handler returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logging;

impl Middleware for Logging {
    fn wrap(&self, next: Handler) -> Handler {
        Handler::new(move |ctx| {
            let start = Instant::now();
            let result = next.call(ctx);
            let elapsed = start.elapsed();

            // an error not yet rendered will be answered with its own status
            let status = match &result {
                Err(err) if !ctx.response().is_committed() => err.status(),
                _ => ctx.response().status(),
            };
            let target = ctx.target();

            tracing::info!(
                method = %ctx.method(),
                target = %target,
                status = status.as_u16(),
                elapsed = ?elapsed,
                "[{}] {:?} {:?}",
                ctx.method(),
                target,
                elapsed
            );
            metrics::record_request(ctx.method(), status, elapsed);

            result
        })
    }
}

/// Wrap `next` with [`Logging`].
pub fn logging(next: Handler) -> Handler {
    Logging.wrap(next)
}
