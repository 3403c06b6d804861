//! Per-request context and response sink.
//!
//! # Responsibilities
//! - Carry the bound path parameters to every handler in a chain
//! - Expose the incoming request as a read-only view
//! - Accumulate the response (status, headers, body) as handlers write it
//!
//! # Design Decisions
//! - One `Context` per request, owned by the thread dispatching it
//! - The first body write or explicit `write_header` commits the status
//! - Writing is cumulative; there is no finalize step

use std::io;

use percent_encoding::percent_decode_str;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, Response, StatusCode};

use crate::routing::Params;

/// Response sink handed to handlers through the [`Context`].
#[derive(Debug)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    committed: bool,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
            committed: false,
        }
    }

    /// Status that will be sent (200 unless written otherwise).
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header changes after the status is committed still reach the client,
    /// since nothing is flushed before the chain returns.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Whether a status or any body bytes have been written.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Commit the response status. Later calls are ignored.
    pub fn write_header(&mut self, status: StatusCode) {
        if self.committed {
            tracing::warn!(
                current = %self.status,
                ignored = %status,
                "superfluous write_header call"
            );
            return;
        }
        self.status = status;
        self.committed = true;
    }

    /// Append bytes to the body, committing the current status.
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.committed = true;
        self.body.extend_from_slice(data);
    }

    pub fn write_str(&mut self, data: &str) {
        self.write_bytes(data.as_bytes());
    }

    /// Plain text error reply.
    pub fn error(&mut self, status: StatusCode, message: &str) {
        self.headers.remove(header::CONTENT_LENGTH);
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        self.headers.insert(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        );
        self.write_header(status);
        self.write_str(message);
        self.write_str("\n");
    }

    /// Reply with the standard 404 body.
    pub fn not_found(&mut self) {
        self.error(StatusCode::NOT_FOUND, "404 page not found");
    }

    /// Redirect to `location` with the given 3xx status.
    ///
    /// GET and HEAD replies carry an HTML content type; GET also gets a short
    /// link body for clients that do not follow redirects.
    pub fn redirect(&mut self, method: &Method, location: &str, status: StatusCode) {
        match HeaderValue::from_str(location) {
            Ok(value) => {
                self.headers.insert(header::LOCATION, value);
                let is_get = method == Method::GET;
                if (is_get || method == Method::HEAD)
                    && !self.headers.contains_key(header::CONTENT_TYPE)
                {
                    self.headers.insert(
                        header::CONTENT_TYPE,
                        HeaderValue::from_static("text/html; charset=utf-8"),
                    );
                }
                self.write_header(status);
                if is_get {
                    let reason = status.canonical_reason().unwrap_or_default();
                    self.write_str(&format!(
                        "<a href=\"{}\">{}</a>.\n\n",
                        html_escape(location),
                        reason
                    ));
                }
            }
            Err(e) => {
                tracing::warn!(location = %location, error = %e, "Invalid redirect location");
                self.error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    StatusCode::INTERNAL_SERVER_ERROR.canonical_reason().unwrap_or_default(),
                );
            }
        }
    }

    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(Bytes::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl io::Write for ResponseWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Percent-decode a request path.
///
/// `%2F` becomes a plain `/` and so separates segments afterwards. Malformed
/// escapes are kept verbatim and invalid UTF-8 is replaced.
pub fn decode_path(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Per-request carrier of parameters, request and response sink.
#[derive(Debug)]
pub struct Context {
    params: Params,
    path: String,
    request: Request<Bytes>,
    writer: ResponseWriter,
}

impl Context {
    pub fn new(request: Request<Bytes>, params: Params) -> Self {
        let path = decode_path(request.uri().path());
        Self::with_path(request, path, params)
    }

    /// Build a context around a path that is already decoded.
    pub fn with_path(request: Request<Bytes>, path: String, params: Params) -> Self {
        Self {
            params,
            path,
            request,
            writer: ResponseWriter::new(),
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Shortcut for `params().get(name)`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// The decoded request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path exactly as it appeared on the wire.
    pub fn raw_path(&self) -> &str {
        self.request.uri().path()
    }

    /// The raw request target, query included.
    pub fn target(&self) -> String {
        self.request.uri().to_string()
    }

    pub fn writer(&mut self) -> &mut ResponseWriter {
        &mut self.writer
    }

    pub fn response(&self) -> &ResponseWriter {
        &self.writer
    }

    /// Borrow the request and the writer at the same time.
    pub fn parts_mut(&mut self) -> (&Request<Bytes>, &mut ResponseWriter) {
        (&self.request, &mut self.writer)
    }

    pub fn into_response(self) -> Response<Bytes> {
        self.writer.into_response()
    }
}
