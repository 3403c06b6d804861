//! segment-router demo server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ axum (timeout, request id, trace, body limit)
//!                        │
//!                        ▼  spawn_blocking, one thread per request
//!                    Dispatcher ── no match ──▶ 404
//!                        │
//!                        ▼  RouteTable: method → pattern → chain
//!                    Logging ▶ Recovery ▶ StaticFiles ▶ handler
//!                        │
//!     Client Response    ▼
//!     ◀───────────── ResponseWriter
//! ```

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use segment_router::app::demo_routes;
use segment_router::config::Cli;
use segment_router::error::ServerError;
use segment_router::fs::DirProvider;
use segment_router::http::middleware::install_panic_hook;
use segment_router::http::{Dispatcher, HttpServer, StaticFiles};
use segment_router::lifecycle::{spawn_signal_handler, Shutdown};
use segment_router::observability::{logging, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let print_config = cli.print_config;
    let config = cli.into_config()?;

    if print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    logging::init(&config.observability.log_level)?;
    install_panic_hook();
    tracing::info!("segment-router v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        static_root = %config.static_files.root,
        max_concurrent_requests = config.listener.max_concurrent_requests,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let static_files = StaticFiles::new(DirProvider::new(&config.static_files.root))
        .with_index_file(config.static_files.index_file.clone());
    let dispatcher = Arc::new(Dispatcher::new(demo_routes(static_files)?));

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| ServerError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    spawn_signal_handler(&shutdown);

    let server = HttpServer::new(config, dispatcher);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
