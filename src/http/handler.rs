//! Handlers: the units a route chain is built from.

use std::fmt;
use std::sync::Arc;

use crate::error::HandlerError;
use crate::http::context::Context;

/// Outcome of running a handler.
pub type HandlerResult = Result<(), HandlerError>;

type HandlerFn = dyn Fn(&mut Context) -> HandlerResult + Send + Sync;

/// A shareable, type-erased request handler.
///
/// Middleware wrap one `Handler` into another, so a whole route chain is
/// itself a single `Handler`.
#[derive(Clone)]
pub struct Handler {
    inner: Arc<HandlerFn>,
}

impl Handler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// A handler that does nothing, used as the end of static-only chains.
    pub fn noop() -> Self {
        Self::new(|_| Ok(()))
    }

    /// A handler answering with a fixed line of text.
    pub fn text(body: impl Into<String>) -> Self {
        let body = body.into();
        Self::new(move |ctx| {
            let writer = ctx.writer();
            writer.write_str(&body);
            writer.write_str("\n");
            Ok(())
        })
    }

    pub fn call(&self, ctx: &mut Context) -> HandlerResult {
        (self.inner)(ctx)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}
