//! Middleware: handler-to-handler transformations.
//!
//! # Data Flow
//! ```text
//! Chain::new().with(Logging).with(Recovery).with(StaticFiles).then(terminal)
//!
//!     Logging ──▶ Recovery ──▶ StaticFiles ──▶ terminal
//!       │            │             │
//!       │            │             └─ GET/HEAD resource found: serve, stop
//!       │            └─ panic below: log, 500 if nothing written
//!       └─ one completion line per request
//! ```
//!
//! # Design Decisions
//! - Every route assembles its own chain at registration time
//! - No global middleware stack
//! - First middleware added is the outermost

use std::sync::Arc;

use crate::http::handler::Handler;

pub mod logging;
pub mod recovery;
pub mod static_files;

pub use logging::{logging, Logging};
pub use recovery::{install_panic_hook, recovery, Recovery};
pub use static_files::StaticFiles;

/// Wraps a handler with cross-cutting behavior.
pub trait Middleware: Send + Sync {
    fn wrap(&self, next: Handler) -> Handler;
}

/// Ordered middleware stack for one route.
#[derive(Clone, Default)]
pub struct Chain {
    layers: Vec<Arc<dyn Middleware>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `middleware` inside every middleware added before it.
    pub fn with<M>(mut self, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        self.layers.push(Arc::new(middleware));
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Finish the chain with its terminal handler.
    pub fn then(&self, terminal: Handler) -> Handler {
        self.layers
            .iter()
            .rev()
            .fold(terminal, |next, layer| layer.wrap(next))
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain").field("layers", &self.layers.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::context::Context;
    use crate::routing::Params;
    use axum::body::Bytes;
    use axum::http::Request;

    struct Tag(&'static str);

    impl Middleware for Tag {
        fn wrap(&self, next: Handler) -> Handler {
            let tag = self.0;
            Handler::new(move |ctx| {
                ctx.writer().write_str(tag);
                ctx.writer().write_str(">");
                next.call(ctx)?;
                ctx.writer().write_str("<");
                ctx.writer().write_str(tag);
                Ok(())
            })
        }
    }

    #[test]
    fn test_chain_order() {
        let handler = Chain::new()
            .with(Tag("outer"))
            .with(Tag("inner"))
            .then(Handler::new(|ctx| {
                ctx.writer().write_str("terminal");
                Ok(())
            }));

        let request = Request::builder().uri("/").body(Bytes::new()).unwrap();
        let mut ctx = Context::new(request, Params::new());
        handler.call(&mut ctx).unwrap();

        assert_eq!(
            ctx.response().body(),
            b"outer>inner>terminal<inner<outer"
        );
    }

    #[test]
    fn test_empty_chain_is_terminal() {
        let chain = Chain::new();
        assert!(chain.is_empty());

        let handler = chain.then(Handler::text("plain"));
        let request = Request::builder().uri("/").body(Bytes::new()).unwrap();
        let mut ctx = Context::new(request, Params::new());
        handler.call(&mut ctx).unwrap();
        assert_eq!(ctx.response().body(), b"plain\n");
    }
}
