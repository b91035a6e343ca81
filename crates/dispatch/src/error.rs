//! Error types shared by the router, the request context and the server.
//!
//! - [`RouteError`]: a malformed route pattern, detected at registration time
//! - [`HttpError`]: an error carrying the status code the client should see
//! - [`Error`]: the umbrella error returned by context operations and handlers

use http::StatusCode;
use std::error::Error as StdError;
use std::fmt;
use std::io;
use thiserror::Error;

/// Boxed error used for collaborator failures (renderers, application handlers).
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Raised by [`Router::add`](crate::Router::add) when a pattern can not be registered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("catch-all segment must be the last segment, pattern: {pattern}")]
    CatchAllNotLast { pattern: String },

    #[error("parameter segment must have a name, pattern: {pattern}")]
    EmptyParamName { pattern: String },

    #[error("parameter `{name}` is declared more than once, pattern: {pattern}")]
    DuplicateParamName { pattern: String, name: String },
}

impl RouteError {
    pub fn catch_all_not_last<S: ToString>(pattern: S) -> Self {
        Self::CatchAllNotLast { pattern: pattern.to_string() }
    }

    pub fn empty_param_name<S: ToString>(pattern: S) -> Self {
        Self::EmptyParamName { pattern: pattern.to_string() }
    }

    pub fn duplicate_param_name<S: ToString, N: ToString>(pattern: S, name: N) -> Self {
        Self::DuplicateParamName { pattern: pattern.to_string(), name: name.to_string() }
    }
}

/// An error that already knows its client visible representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    pub fn new<S: ToString>(status: StatusCode, message: S) -> Self {
        Self { status, message: message.to_string() }
    }

    /// Builds an error whose message is the canonical reason phrase of `status`.
    pub fn from_status(status: StatusCode) -> Self {
        Self::new(status, status.canonical_reason().unwrap_or("Unknown Status"))
    }

    pub fn not_found() -> Self {
        Self::from_status(StatusCode::NOT_FOUND)
    }

    pub fn method_not_allowed() -> Self {
        Self::from_status(StatusCode::METHOD_NOT_ALLOWED)
    }

    pub fn internal() -> Self {
        Self::from_status(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code={}, message={}", self.status.as_u16(), self.message)
    }
}

impl StdError for HttpError {}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{source}")]
    Http {
        #[from]
        source: HttpError,
    },

    #[error("json encode error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("xml encode error: {reason}")]
    Xml { reason: String },

    #[error("invalid redirect status code: {0}")]
    InvalidRedirectCode(StatusCode),

    #[error("renderer not registered")]
    RendererNotRegistered,

    #[error("render error: {source}")]
    Render { source: BoxError },

    #[error("cookie `{name}` not found")]
    CookieNotFound { name: String },

    #[error("request content type is not multipart/form-data")]
    NotMultipart,

    #[error("multipart field `{name}` not found")]
    FormFileNotFound { name: String },

    #[error("multipart error: {source}")]
    Multipart {
        #[from]
        source: multer::Error,
    },

    #[error("invalid form body: {source}")]
    Form {
        #[from]
        source: serde_urlencoded::de::Error,
    },

    #[error("invalid header value: {source}")]
    HeaderValue {
        #[from]
        source: http::header::InvalidHeaderValue,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("handler error: {source}")]
    Handler { source: BoxError },
}

impl Error {
    pub fn xml<S: ToString>(reason: S) -> Self {
        Self::Xml { reason: reason.to_string() }
    }

    pub fn render<E: Into<BoxError>>(e: E) -> Self {
        Self::Render { source: e.into() }
    }

    pub fn cookie_not_found<S: ToString>(name: S) -> Self {
        Self::CookieNotFound { name: name.to_string() }
    }

    pub fn form_file_not_found<S: ToString>(name: S) -> Self {
        Self::FormFileNotFound { name: name.to_string() }
    }

    /// Wraps an application error returned from a handler.
    pub fn handler<E: Into<BoxError>>(e: E) -> Self {
        Self::Handler { source: e.into() }
    }

    /// Returns the [`HttpError`] when this error carries one.
    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            Error::Http { source } => Some(source),
            _ => None,
        }
    }
}
