//! Route registration and lookup.
//!
//! # Responsibilities
//! - Store handlers per method and pattern
//! - Resolve a method and path to a handler plus bound parameters
//!
//! # Design Decisions
//! - Built once at startup, then shared read-only between requests
//! - Registering the same method and pattern twice replaces the handler
//! - Lookup walks the patterns of a method in hash-map order, which is
//!   unspecified. Two patterns that can both match one path (for example
//!   `/users/me` and `/users/:id`) resolve nondeterministically, so callers
//!   must not register such pairs

use std::collections::HashMap;

use axum::http::Method;

use crate::error::RouteError;
use crate::http::handler::Handler;
use crate::routing::pattern::{Params, Pattern};

#[derive(Debug, Clone)]
struct Route {
    pattern: Pattern,
    handler: Handler,
}

/// Method → pattern → handler mapping.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<Method, HashMap<String, Route>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` and `pattern`.
    ///
    /// A later registration for the same pair silently wins.
    pub fn register(
        &mut self,
        method: Method,
        pattern: &str,
        handler: Handler,
    ) -> Result<(), RouteError> {
        let pattern = Pattern::parse(pattern)?;

        let previous = self
            .routes
            .entry(method.clone())
            .or_default()
            .insert(pattern.as_str().to_string(), Route { pattern, handler });

        if let Some(previous) = previous {
            tracing::debug!(
                method = %method,
                pattern = %previous.pattern,
                "Replacing previously registered route"
            );
        }
        Ok(())
    }

    /// Find the handler for `method` whose pattern matches `path`.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<(&Handler, Params)> {
        self.routes.get(method)?.values().find_map(|route| {
            route
                .pattern
                .matches(path)
                .map(|params| (&route.handler, params))
        })
    }

    pub fn get(&mut self, pattern: &str, handler: Handler) -> Result<(), RouteError> {
        self.register(Method::GET, pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: Handler) -> Result<(), RouteError> {
        self.register(Method::POST, pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: Handler) -> Result<(), RouteError> {
        self.register(Method::PUT, pattern, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: Handler) -> Result<(), RouteError> {
        self.register(Method::DELETE, pattern, handler)
    }

    pub fn patch(&mut self, pattern: &str, handler: Handler) -> Result<(), RouteError> {
        self.register(Method::PATCH, pattern, handler)
    }

    pub fn head(&mut self, pattern: &str, handler: Handler) -> Result<(), RouteError> {
        self.register(Method::HEAD, pattern, handler)
    }

    pub fn options(&mut self, pattern: &str, handler: Handler) -> Result<(), RouteError> {
        self.register(Method::OPTIONS, pattern, handler)
    }

    /// Total number of registered routes across all methods.
    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Methods with at least one registered route.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.routes.keys()
    }

    /// Patterns registered for `method`, in no particular order.
    pub fn patterns<'a>(&'a self, method: &Method) -> impl Iterator<Item = &'a str> + 'a {
        self.routes
            .get(method)
            .into_iter()
            .flat_map(|routes| routes.keys().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::context::Context;
    use axum::body::Bytes;
    use axum::http::Request;

    fn run(handler: &Handler) -> Vec<u8> {
        let request = Request::builder().uri("/").body(Bytes::new()).unwrap();
        let mut ctx = Context::new(request, Params::new());
        handler.call(&mut ctx).unwrap();
        ctx.response().body().to_vec()
    }

    #[test]
    fn test_resolve_by_method() {
        let mut table = RouteTable::new();
        table.get("/users", Handler::text("list")).unwrap();
        table.post("/users", Handler::text("create")).unwrap();

        let (handler, params) = table.resolve(&Method::GET, "/users").unwrap();
        assert!(params.is_empty());
        assert_eq!(run(handler), b"list\n");

        let (handler, _) = table.resolve(&Method::POST, "/users").unwrap();
        assert_eq!(run(handler), b"create\n");

        assert!(table.resolve(&Method::DELETE, "/users").is_none());
    }

    #[test]
    fn test_resolve_binds_params() {
        let mut table = RouteTable::new();
        table.get("/users/:id", Handler::noop()).unwrap();
        table.get("/users/:user_id/addr/:addr_id", Handler::noop()).unwrap();

        let (_, params) = table.resolve(&Method::GET, "/users/42").unwrap();
        assert_eq!(params.get("id"), Some("42"));
        assert_eq!(params.len(), 1);

        let (_, params) = table.resolve(&Method::GET, "/users/7/addr/9").unwrap();
        assert_eq!(params.get("user_id"), Some("7"));
        assert_eq!(params.get("addr_id"), Some("9"));
        assert_eq!(params.len(), 2);

        assert!(table.resolve(&Method::GET, "/users/7/addr").is_none());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut table = RouteTable::new();
        table.get("/about", Handler::text("first")).unwrap();
        table.get("/about", Handler::text("second")).unwrap();

        assert_eq!(table.len(), 1);
        let (handler, _) = table.resolve(&Method::GET, "/about").unwrap();
        assert_eq!(run(handler), b"second\n");
    }

    #[test]
    fn test_register_rejects_unnamed_param() {
        let mut table = RouteTable::new();
        let err = table.get("/files/:", Handler::noop()).unwrap_err();
        assert!(matches!(err, RouteError::UnnamedParam { .. }));
        assert!(table.is_empty());
    }

    #[test]
    fn test_inspection() {
        let mut table = RouteTable::new();
        table.get("/", Handler::noop()).unwrap();
        table.get("/about", Handler::noop()).unwrap();
        table.put("/users/:id", Handler::noop()).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.methods().count(), 2);

        let mut patterns: Vec<&str> = table.patterns(&Method::GET).collect();
        patterns.sort_unstable();
        assert_eq!(patterns, vec!["/", "/about"]);
        assert_eq!(table.patterns(&Method::PATCH).count(), 0);
    }
}
