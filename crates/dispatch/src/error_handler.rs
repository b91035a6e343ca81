//! Turns errors returned by handlers into client visible responses.

use crate::context::Context;
use crate::error::Error;
use http::{Method, StatusCode};
use tracing::{error, warn};

/// Writes the response for an error that escaped a handler.
///
/// Installed on the server with [`ServerBuilder::error_handler`](crate::ServerBuilder::error_handler)
/// and reached from handlers through [`Context::error`].
#[cfg_attr(test, mockall::automock)]
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, err: Error, ctx: &mut Context);
}

/// The error handler used when none is configured.
///
/// An [`HttpError`](crate::HttpError) is written with its own status and
/// message; anything else becomes a `500`, whose body carries the error text
/// only in debug mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn handle(&self, err: Error, ctx: &mut Context) {
        let (status, message) = match err.as_http() {
            Some(http_error) => (http_error.status(), http_error.message().to_owned()),
            None if ctx.debug() => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            None => (StatusCode::INTERNAL_SERVER_ERROR, internal_reason()),
        };

        error!(cause = %err, method = %ctx.request().method(), uri = %ctx.request().uri(), status = status.as_u16(), "request failed");

        if ctx.response().committed() {
            warn!(status = %ctx.response().status(), "response already committed, error response skipped");
            return;
        }

        let written = if ctx.request().method() == Method::HEAD { ctx.no_content(status) } else { ctx.string(status, &message) };
        if let Err(e) = written {
            error!(cause = %e, "failed to write error response");
        }
    }
}

fn internal_reason() -> String {
    StatusCode::INTERNAL_SERVER_ERROR.canonical_reason().unwrap_or_default().to_owned()
}
