//! Segment-pattern HTTP request dispatcher with per-route middleware chains.

pub mod app;
pub mod config;
pub mod error;
pub mod fs;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::ServerConfig;
pub use error::{HandlerError, RouteError, ServerError};
pub use http::{Context, Dispatcher, Handler, HttpServer};
pub use lifecycle::Shutdown;
pub use routing::{match_path, Params, RouteTable};
