//! Panic recovery middleware.
//!
//! # Design Decisions
//! - The only place panics from handlers are contained
//! - Install inside `Logging` so failed requests are still timed
//! - A response already being written is left alone
//! - With [`install_panic_hook`], a contained panic produces only the
//!   `Panic :` event; panics outside any `Recovery` keep the default report

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use axum::http::StatusCode;

use crate::http::handler::Handler;
use crate::http::middleware::Middleware;
use crate::observability::metrics;

/// Turns a panic anywhere below it into a 500 response.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recovery;

impl Middleware for Recovery {
    fn wrap(&self, next: Handler) -> Handler {
        Handler::new(move |ctx| {
            let outcome = {
                let _guard = RecoveryScope::enter();
                panic::catch_unwind(AssertUnwindSafe(|| next.call(ctx)))
            };

            match outcome {
                Ok(result) => result,
                Err(payload) => {
                    let details = panic_message(payload.as_ref());
                    let location = LAST_LOCATION.with(|slot| slot.borrow_mut().take());
                    tracing::error!(
                        path = %ctx.path(),
                        location = location.as_deref().unwrap_or("unknown"),
                        "Panic : {}",
                        details
                    );
                    metrics::record_panic();

                    let writer = ctx.writer();
                    if writer.is_committed() {
                        tracing::debug!("Response already started, leaving it as is");
                    } else {
                        let status = StatusCode::INTERNAL_SERVER_ERROR;
                        writer.error(status, status.canonical_reason().unwrap_or_default());
                    }
                    Ok(())
                }
            }
        })
    }
}

thread_local! {
    static RECOVERY_DEPTH: Cell<usize> = const { Cell::new(0) };
    static LAST_LOCATION: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Marks the current thread as running under a `Recovery` guard.
struct RecoveryScope;

impl RecoveryScope {
    fn enter() -> Self {
        RECOVERY_DEPTH.with(|depth| depth.set(depth.get() + 1));
        LAST_LOCATION.with(|slot| slot.borrow_mut().take());
        RecoveryScope
    }
}

impl Drop for RecoveryScope {
    fn drop(&mut self) {
        RECOVERY_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

fn is_recovering() -> bool {
    RECOVERY_DEPTH.with(|depth| depth.get() > 0)
}

static PANIC_HOOK: Once = Once::new();

/// Replace the process panic hook so panics contained by [`Recovery`] are
/// reported once, through tracing, instead of also on stderr.
///
/// Panics on threads not inside a `Recovery` guard go to the previous hook.
/// Calling this more than once has no further effect.
pub fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if is_recovering() {
                let location = info
                    .location()
                    .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));
                LAST_LOCATION.with(|slot| *slot.borrow_mut() = location);
            } else {
                previous(info);
            }
        }));
    });
}

/// Wrap `next` with [`Recovery`].
pub fn recovery(next: Handler) -> Handler {
    Recovery.wrap(next)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
