//! Error types shared across subsystems.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors raised while registering a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// A `:` segment without a name.
    #[error("parameters must be registered with a name in pattern {pattern:?}")]
    UnnamedParam { pattern: String },

    /// The same parameter name appears twice in one pattern.
    #[error("parameter {name:?} is bound more than once in pattern {pattern:?}")]
    DuplicateParam { pattern: String, name: String },
}

/// Expected failures returned by handlers.
///
/// Anything that reaches the dispatcher unhandled is turned into a plain
/// text response with the matching status code.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found")]
    NotFound,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HandlerError {
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HandlerError::NotFound => StatusCode::NOT_FOUND,
            HandlerError::Internal(_) | HandlerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors from the transport layer.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to install metrics exporter: {0}")]
    Metrics(String),

    #[error("failed to install log subscriber: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error_status() {
        assert_eq!(HandlerError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(HandlerError::NotFound.status(), StatusCode::NOT_FOUND);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(HandlerError::from(io).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_route_error_display() {
        let err = RouteError::UnnamedParam { pattern: "/x/:".into() };
        assert_eq!(
            err.to_string(),
            "parameters must be registered with a name in pattern \"/x/:\""
        );
    }
}
