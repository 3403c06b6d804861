//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Middleware and dispatcher produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows in through tower-http and shows up in trace spans
//! - Metrics are cheap (atomic increments) and inert without a recorder

pub mod logging;
pub mod metrics;
