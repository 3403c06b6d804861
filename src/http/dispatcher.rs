//! Request dispatch.
//!
//! # Responsibilities
//! - Percent-decode the path once, then resolve it against the current
//!   route table
//! - Build the per-request `Context` and run the route's chain
//! - Answer unmatched requests with 404
//! - Render handler errors that nothing below answered
//!
//! # Design Decisions
//! - Per request: matching → dispatched, or matching → not found. No retries
//!   and at most one handler chain runs
//! - No `Context` exists for unmatched requests
//! - The route table is an atomically swapped snapshot; requests in flight
//!   finish on the table they started with

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::body::Bytes;
use axum::http::{Request, Response};

use crate::error::RouteError;
use crate::http::context::{decode_path, Context, ResponseWriter};
use crate::observability::metrics;
use crate::routing::RouteTable;

/// Entry point from the transport into the routing core.
pub struct Dispatcher {
    routes: ArcSwap<RouteTable>,
}

impl Dispatcher {
    pub fn new(routes: RouteTable) -> Self {
        Self {
            routes: ArcSwap::from_pointee(routes),
        }
    }

    /// Snapshot of the route table currently in use.
    pub fn routes(&self) -> Arc<RouteTable> {
        self.routes.load_full()
    }

    /// Replace the whole route table.
    pub fn replace_routes(&self, routes: RouteTable) {
        tracing::info!(routes = routes.len(), "Route table replaced");
        self.routes.store(Arc::new(routes));
    }

    /// Apply `update` to a copy of the current table and publish it.
    ///
    /// Retries when another update won the race, so `update` may run more
    /// than once. Nothing is published if it fails.
    pub fn update_routes<F>(&self, update: F) -> Result<(), RouteError>
    where
        F: Fn(&mut RouteTable) -> Result<(), RouteError>,
    {
        loop {
            let current = self.routes.load_full();
            let mut next = RouteTable::clone(&current);
            update(&mut next)?;

            let previous = self.routes.compare_and_swap(&current, Arc::new(next));
            if Arc::ptr_eq(&previous, &current) {
                return Ok(());
            }
        }
    }

    /// Run the request through its route's chain and return the response.
    ///
    /// Runs synchronously; panics not contained by a `Recovery` middleware
    /// propagate to the caller.
    pub fn dispatch(&self, request: Request<Bytes>) -> Response<Bytes> {
        let path = decode_path(request.uri().path());
        let resolved = {
            let routes = self.routes.load();
            routes
                .resolve(request.method(), &path)
                .map(|(handler, params)| (handler.clone(), params))
        };

        let Some((handler, params)) = resolved else {
            tracing::debug!(
                method = %request.method(),
                path = %request.uri().path(),
                "No route matched"
            );
            metrics::record_not_found(request.method());

            let mut writer = ResponseWriter::new();
            writer.not_found();
            return writer.into_response();
        };

        let mut ctx = Context::with_path(request, path, params);
        if let Err(err) = handler.call(&mut ctx) {
            tracing::warn!(
                method = %ctx.method(),
                path = %ctx.path(),
                error = %err,
                "Handler returned an error"
            );
            let writer = ctx.writer();
            if !writer.is_committed() {
                writer.error(err.status(), &err.to_string());
            }
        }

        ctx.into_response()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(RouteTable::new())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes.load().len())
            .finish()
    }
}
