//! Demo application routes.
//!
//! # Routes
//! ```text
//! GET  /                               Welcome !
//! GET  /about                          This is ABOUT Page !
//! GET  /public/index.html              Logging ⊃ Recovery ⊃ StaticFiles ⊃ no-op
//! GET  /users/:id                      Logging ⊃ Recovery ⊃ retrieve_user
//! POST /users                          Create User Page !
//! GET  /users/:user_id/addr/:addr_id   Logging ⊃ retrieve_address
//! POST /users/:user_id/addr/           Logging ⊃ retrieve_user_addresses
//! ```

use std::io::Write;

use crate::error::{HandlerError, RouteError};
use crate::fs::FileProvider;
use crate::http::context::Context;
use crate::http::handler::{Handler, HandlerResult};
use crate::http::middleware::{logging, Chain, Logging, Recovery, StaticFiles};
use crate::routing::RouteTable;

/// Build the demo route table, serving `/public/index.html` through
/// `static_files`.
pub fn demo_routes<P: FileProvider>(static_files: StaticFiles<P>) -> Result<RouteTable, RouteError> {
    let guarded = Chain::new().with(Logging).with(Recovery);

    let mut routes = RouteTable::new();
    routes.get("/", Handler::text("Welcome !"))?;
    routes.get("/about", Handler::text("This is ABOUT Page !"))?;
    routes.get(
        "/public/index.html",
        guarded.clone().with(static_files).then(Handler::noop()),
    )?;
    routes.get("/users/:id", guarded.then(Handler::new(retrieve_user)))?;
    routes.post("/users", Handler::text("Create User Page !"))?;
    routes.get(
        "/users/:user_id/addr/:addr_id",
        logging(Handler::new(retrieve_address)),
    )?;
    routes.post(
        "/users/:user_id/addr/",
        logging(Handler::new(retrieve_user_addresses)),
    )?;

    tracing::debug!(routes = routes.len(), "Demo routes registered");
    Ok(routes)
}

fn retrieve_user(ctx: &mut Context) -> HandlerResult {
    let id = ctx.param("id").unwrap_or_default().to_string();
    if id == "0" {
        return Err(HandlerError::BadRequest("id is zero".to_string()));
    }
    writeln!(ctx.writer(), "Retrieve User id : {}", id)?;
    Ok(())
}

fn retrieve_address(ctx: &mut Context) -> HandlerResult {
    let user_id = ctx.param("user_id").unwrap_or_default().to_string();
    let addr_id = ctx.param("addr_id").unwrap_or_default().to_string();
    writeln!(
        ctx.writer(),
        "Retrieve User id : {}, Address id : {}",
        user_id,
        addr_id
    )?;
    Ok(())
}

fn retrieve_user_addresses(ctx: &mut Context) -> HandlerResult {
    let user_id = ctx.param("user_id").unwrap_or_default().to_string();
    writeln!(ctx.writer(), "Retrieve User id : {}", user_id)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FileMeta, OpenFile};
    use crate::http::dispatcher::Dispatcher;
    use axum::body::Bytes;
    use axum::http::{Method, Request, StatusCode};
    use std::io::{self, Cursor};

    struct OnePage;

    impl FileProvider for OnePage {
        fn open(&self, path: &str) -> io::Result<OpenFile> {
            if path != "/public/index.html" {
                return Err(io::ErrorKind::NotFound.into());
            }
            let body = b"<h1>public</h1>".to_vec();
            let meta = FileMeta {
                is_dir: false,
                len: body.len() as u64,
                modified: None,
            };
            Ok(OpenFile::new(meta, Cursor::new(body)))
        }
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(demo_routes(StaticFiles::new(OnePage)).unwrap())
    }

    fn send(dispatcher: &Dispatcher, method: Method, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().method(method).uri(uri).body(Bytes::new()).unwrap();
        let response = dispatcher.dispatch(request);
        let body = String::from_utf8(response.body().to_vec()).unwrap();
        (response.status(), body)
    }

    #[test]
    fn test_plain_pages() {
        let d = dispatcher();
        assert_eq!(send(&d, Method::GET, "/"), (StatusCode::OK, "Welcome !\n".into()));
        assert_eq!(
            send(&d, Method::GET, "/about"),
            (StatusCode::OK, "This is ABOUT Page !\n".into())
        );
        assert_eq!(
            send(&d, Method::POST, "/users"),
            (StatusCode::OK, "Create User Page !\n".into())
        );
    }

    #[test]
    fn test_user_routes() {
        let d = dispatcher();
        assert_eq!(
            send(&d, Method::GET, "/users/42"),
            (StatusCode::OK, "Retrieve User id : 42\n".into())
        );
        assert_eq!(
            send(&d, Method::GET, "/users/7/addr/3"),
            (StatusCode::OK, "Retrieve User id : 7, Address id : 3\n".into())
        );
        assert_eq!(
            send(&d, Method::POST, "/users/7/addr/"),
            (StatusCode::OK, "Retrieve User id : 7\n".into())
        );
    }

    #[test]
    fn test_escaped_user_id() {
        assert_eq!(
            send(&dispatcher(), Method::GET, "/users/john%20doe"),
            (StatusCode::OK, "Retrieve User id : john doe\n".into())
        );
    }

    #[test]
    fn test_zero_id_is_bad_request() {
        let (status, body) = send(&dispatcher(), Method::GET, "/users/0");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "bad request: id is zero\n");
    }

    #[test]
    fn test_static_page() {
        let (status, body) = send(&dispatcher(), Method::GET, "/public/index.html");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<h1>public</h1>");
    }

    #[test]
    fn test_unregistered_method_is_404() {
        let (status, _) = send(&dispatcher(), Method::DELETE, "/users/1");
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
