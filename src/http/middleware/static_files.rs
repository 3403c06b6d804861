//! Static file fallback middleware.
//!
//! # Responsibilities
//! - Serve GET/HEAD requests whose path names a readable resource
//! - Redirect directory paths lacking a trailing `/` (302)
//! - Serve the index file of a directory requested with a trailing `/`
//! - Fall through to the next handler in every other case
//!
//! # Design Decisions
//! - Lookup and read failures are never an error response of their own
//! - The redirected request can only serve the index or fall through

use std::sync::Arc;

use axum::http::{Method, StatusCode};

use crate::fs::{join_path, serve_content, FileProvider};
use crate::http::handler::Handler;
use crate::http::middleware::Middleware;

pub const DEFAULT_INDEX_FILE: &str = "index.html";

/// Serves files from a [`FileProvider`] before reaching the wrapped handler.
pub struct StaticFiles<P> {
    provider: Arc<P>,
    index_file: String,
}

impl<P: FileProvider> StaticFiles<P> {
    pub fn new(provider: P) -> Self {
        Self::from_shared(Arc::new(provider))
    }

    /// Share one provider between several routes.
    pub fn from_shared(provider: Arc<P>) -> Self {
        Self {
            provider,
            index_file: DEFAULT_INDEX_FILE.to_string(),
        }
    }

    /// File looked up inside directories requested with a trailing `/`.
    pub fn with_index_file(mut self, index_file: impl Into<String>) -> Self {
        self.index_file = index_file.into();
        self
    }
}

impl<P> Clone for StaticFiles<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            index_file: self.index_file.clone(),
        }
    }
}

impl<P> std::fmt::Debug for StaticFiles<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticFiles")
            .field("index_file", &self.index_file)
            .finish_non_exhaustive()
    }
}

impl<P: FileProvider> Middleware for StaticFiles<P> {
    fn wrap(&self, next: Handler) -> Handler {
        let provider = Arc::clone(&self.provider);
        let index_file = self.index_file.clone();

        Handler::new(move |ctx| {
            if ctx.method() != Method::GET && ctx.method() != Method::HEAD {
                return next.call(ctx);
            }

            let path = ctx.path().to_string();
            let file = match provider.open(&path) {
                Ok(file) => file,
                Err(e) => {
                    tracing::debug!(path = %path, error = %e, "No static resource, falling through");
                    return next.call(ctx);
                }
            };

            let (file, name) = if file.is_dir() {
                if !path.ends_with('/') {
                    let location = format!("{}/", ctx.raw_path());
                    let method = ctx.method().clone();
                    ctx.writer().redirect(&method, &location, StatusCode::FOUND);
                    return Ok(());
                }

                let index = join_path(&path, &index_file);
                match provider.open(&index) {
                    Ok(file) if !file.is_dir() => (file, index),
                    _ => {
                        tracing::debug!(path = %path, "Directory has no index, falling through");
                        return next.call(ctx);
                    }
                }
            } else {
                (file, path)
            };

            let (request, writer) = ctx.parts_mut();
            match serve_content(request, writer, &name, file) {
                Ok(()) => Ok(()),
                Err(e) if !writer.is_committed() => {
                    tracing::warn!(file = %name, error = %e, "Failed to read static resource, falling through");
                    next.call(ctx)
                }
                Err(e) => Err(e.into()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FileMeta, OpenFile};
    use crate::http::context::Context;
    use crate::routing::Params;
    use axum::body::Bytes;
    use axum::http::{header, Request};
    use std::collections::HashMap;
    use std::io::{self, Cursor};
    use std::time::{Duration, UNIX_EPOCH};

    #[derive(Default)]
    struct MemoryProvider {
        files: HashMap<&'static str, &'static str>,
        dirs: Vec<&'static str>,
    }

    impl FileProvider for MemoryProvider {
        fn open(&self, path: &str) -> io::Result<OpenFile> {
            let path = crate::fs::clean_path(path);
            let modified = Some(UNIX_EPOCH + Duration::from_secs(1_600_000_000));
            if self.dirs.iter().any(|dir| *dir == path) {
                let meta = FileMeta { is_dir: true, len: 0, modified };
                return Ok(OpenFile::new(meta, Cursor::new(Vec::new())));
            }
            match self.files.get(path.as_str()) {
                Some(body) => {
                    let meta = FileMeta { is_dir: false, len: body.len() as u64, modified };
                    Ok(OpenFile::new(meta, Cursor::new(body.as_bytes().to_vec())))
                }
                None => Err(io::Error::from(io::ErrorKind::NotFound)),
            }
        }
    }

    fn provider() -> MemoryProvider {
        MemoryProvider {
            files: HashMap::from([
                ("/public/index.html", "<h1>public</h1>"),
                ("/public/style.css", "body {}"),
                ("/public/my file.txt", "hello"),
            ]),
            dirs: vec!["/", "/public", "/empty"],
        }
    }

    fn handler() -> Handler {
        StaticFiles::new(provider()).wrap(Handler::text("fallthrough"))
    }

    fn run(method: Method, uri: &str) -> Context {
        let request = Request::builder().method(method).uri(uri).body(Bytes::new()).unwrap();
        let mut ctx = Context::new(request, Params::new());
        handler().call(&mut ctx).unwrap();
        ctx
    }

    #[test]
    fn test_serves_file() {
        let ctx = run(Method::GET, "/public/style.css");
        assert_eq!(ctx.response().status(), StatusCode::OK);
        assert_eq!(ctx.response().body(), b"body {}");
        assert_eq!(ctx.response().headers()[header::CONTENT_TYPE], "text/css");
    }

    #[test]
    fn test_directory_redirect() {
        let ctx = run(Method::GET, "/public");
        assert_eq!(ctx.response().status(), StatusCode::FOUND);
        assert_eq!(ctx.response().headers()[header::LOCATION], "/public/");
    }

    #[test]
    fn test_escaped_name_is_decoded() {
        let ctx = run(Method::GET, "/public/my%20file.txt");
        assert_eq!(ctx.response().status(), StatusCode::OK);
        assert_eq!(ctx.response().body(), b"hello");
    }

    #[test]
    fn test_redirect_keeps_escaped_location() {
        let handler = StaticFiles::new(MemoryProvider {
            files: HashMap::new(),
            dirs: vec!["/my dir"],
        })
        .wrap(Handler::noop());
        let request = Request::builder().uri("/my%20dir").body(Bytes::new()).unwrap();
        let mut ctx = Context::new(request, Params::new());
        handler.call(&mut ctx).unwrap();

        assert_eq!(ctx.response().status(), StatusCode::FOUND);
        assert_eq!(ctx.response().headers()[header::LOCATION], "/my%20dir/");
        assert_eq!(ctx.response().body(), b"<a href=\"/my%20dir/\">Found</a>.\n\n");
    }

    #[test]
    fn test_redirect_target_serves_index() {
        let ctx = run(Method::GET, "/public/");
        assert_eq!(ctx.response().status(), StatusCode::OK);
        assert_eq!(ctx.response().body(), b"<h1>public</h1>");
        assert_eq!(
            ctx.response().headers()[header::CONTENT_TYPE],
            "text/html"
        );
    }

    #[test]
    fn test_directory_without_index_falls_through() {
        let ctx = run(Method::GET, "/empty/");
        assert_eq!(ctx.response().body(), b"fallthrough\n");
    }

    #[test]
    fn test_missing_file_falls_through() {
        let ctx = run(Method::GET, "/public/missing.js");
        assert_eq!(ctx.response().body(), b"fallthrough\n");
    }

    #[test]
    fn test_other_methods_pass_through() {
        let ctx = run(Method::POST, "/public/style.css");
        assert_eq!(ctx.response().body(), b"fallthrough\n");
    }

    #[test]
    fn test_head_serves_headers_only() {
        let ctx = run(Method::HEAD, "/public/style.css");
        assert_eq!(ctx.response().status(), StatusCode::OK);
        assert!(ctx.response().body().is_empty());
        assert_eq!(ctx.response().headers()[header::CONTENT_LENGTH], "7");
    }

    #[test]
    fn test_custom_index_file() {
        let handler = StaticFiles::new(provider())
            .with_index_file("style.css")
            .wrap(Handler::noop());
        let request = Request::builder().uri("/public/").body(Bytes::new()).unwrap();
        let mut ctx = Context::new(request, Params::new());
        handler.call(&mut ctx).unwrap();
        assert_eq!(ctx.response().body(), b"body {}");
    }
}
