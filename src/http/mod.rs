//! HTTP handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum, body buffering, one blocking thread per request)
//!     → dispatcher.rs (route lookup; 404 when nothing matches)
//!     → context.rs (params + request + response sink)
//!     → middleware/ (Logging ⊃ Recovery ⊃ StaticFiles, as chosen per route)
//!     → handler.rs (terminal handler writes the response)
//!     → Response back through server.rs
//! ```

pub mod context;
pub mod dispatcher;
pub mod handler;
pub mod middleware;
pub mod server;

pub use context::{Context, ResponseWriter};
pub use dispatcher::Dispatcher;
pub use handler::{Handler, HandlerResult};
pub use middleware::{Chain, Logging, Middleware, Recovery, StaticFiles};
pub use server::HttpServer;
