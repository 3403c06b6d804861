//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_requests_total` (counter): completed requests by method, status
//! - `router_request_duration_seconds` (histogram): time spent in the chain
//! - `router_panics_total` (counter): panics contained by recovery
//! - `router_not_found_total` (counter): requests no route matched
//!
//! Recording is a no-op until a recorder is installed, so handlers and
//! tests never need a running exporter.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::ServerError;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), ServerError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| ServerError::Metrics(e.to_string()))?;

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &Method, status: StatusCode, elapsed: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.as_u16().to_string()),
    ];
    metrics::counter!("router_requests_total", &labels).increment(1);
    metrics::histogram!("router_request_duration_seconds", &labels).record(elapsed.as_secs_f64());
}

pub fn record_panic() {
    metrics::counter!("router_panics_total").increment(1);
}

pub fn record_not_found(method: &Method) {
    metrics::counter!("router_not_found_total", "method" => method.to_string()).increment(1);
}
