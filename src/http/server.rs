//! HTTP server setup.
//!
//! # Responsibilities
//! - Accept connections and parse HTTP via Axum
//! - Buffer each request body (bounded by config)
//! - Hand the request to the `Dispatcher` on its own blocking thread
//! - Wire up transport-level layers (timeout, request ID, tracing)
//!
//! # Design Decisions
//! - Handlers are synchronous; `spawn_blocking` gives every request its own
//!   thread of control so blocking file reads never stall the runtime
//! - Concurrent dispatches are bounded by a semaphore
//! - A panic that escapes a route without `Recovery` is resumed in that
//!   request's task only; the connection drops, the server keeps serving

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, Method, Request, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Semaphore};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::http::dispatcher::Dispatcher;

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub permits: Arc<Semaphore>,
}

/// HTTP front end for a [`Dispatcher`].
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    pub fn new(config: ServerConfig, dispatcher: Arc<Dispatcher>) -> Self {
        let state = AppState {
            dispatcher,
            permits: Arc::new(Semaphore::new(config.listener.max_concurrent_requests)),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve connections from `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Forwards every request to the dispatcher.
async fn dispatch_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut request = Request::new(body);
    *request.method_mut() = method;
    *request.uri_mut() = uri;
    *request.version_mut() = version;
    *request.headers_mut() = headers;

    let permit = match Arc::clone(&state.permits).acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            tracing::error!("Dispatch semaphore closed");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    };

    let dispatcher = Arc::clone(&state.dispatcher);
    let joined = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        dispatcher.dispatch(request)
    })
    .await;

    match joined {
        Ok(response) => response.map(Body::from),
        Err(e) if e.is_panic() => {
            tracing::error!("Handler panicked outside of recovery, dropping request");
            std::panic::resume_unwind(e.into_panic())
        }
        Err(e) => {
            tracing::error!(error = %e, "Dispatch task cancelled");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
