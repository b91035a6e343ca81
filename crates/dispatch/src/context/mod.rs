//! The per-request context.
//!
//! A [`Context`] binds everything one request needs while its handler runs:
//! the request, the response being written, the path parameters bound by the
//! router, lazily parsed query and form values, a free-form store for
//! middleware and the shared renderer and error handler of the server.
//!
//! A context belongs to exactly one request at a time. Servers recycle contexts
//! through a pool and [`Context::reset`] them between requests; a reset
//! context can not be told apart from a fresh one.

mod cookie;
mod form;
mod multipart;
mod writer;

pub use form::Values;
pub use multipart::{FileHeader, MultipartForm};
pub use writer::{DEFAULT_INDENT, XML_HEADER};

use crate::error::Error;
use crate::handler::HandlerRef;
use crate::response::Response;
use crate::router::{ParamSink, Route};
use crate::server::Shared;
use bytes::Bytes;
use http::header::{HeaderName, CONNECTION, UPGRADE};
use http::Request;
use once_cell::sync::Lazy;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

static NO_PARAM_NAMES: Lazy<Arc<[String]>> = Lazy::new(|| Arc::from(Vec::new()));

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
const X_FORWARDED_PROTOCOL: HeaderName = HeaderName::from_static("x-forwarded-protocol");
const X_FORWARDED_SSL: HeaderName = HeaderName::from_static("x-forwarded-ssl");
const X_URL_SCHEME: HeaderName = HeaderName::from_static("x-url-scheme");
const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

pub struct Context {
    request: Request<Bytes>,
    response: Response,
    route: Option<Arc<Route>>,
    param_names: Arc<[String]>,
    // slots are reused across requests, only the first `param_len` are live
    param_values: Vec<String>,
    param_len: usize,
    query: Option<Values>,
    form: Option<Values>,
    multipart: Option<MultipartForm>,
    store: HashMap<String, Box<dyn Any + Send + Sync>>,
    shared: Arc<Shared>,
}

impl Context {
    pub(crate) fn new(request: Request<Bytes>, response: Response, shared: Arc<Shared>, max_params: usize) -> Self {
        Self {
            request,
            response,
            route: None,
            param_names: Arc::clone(&NO_PARAM_NAMES),
            param_values: std::iter::repeat_with(String::new).take(max_params).collect(),
            param_len: 0,
            query: None,
            form: None,
            multipart: None,
            store: HashMap::new(),
            shared,
        }
    }

    /// Rebinds the context to a new request and response, dropping every trace of the previous one.
    pub fn reset(&mut self, request: Request<Bytes>, response: Response) {
        self.request = request;
        self.response = response;
        self.route = None;
        self.param_names = Arc::clone(&NO_PARAM_NAMES);
        self.param_len = 0;
        self.query = None;
        self.form = None;
        self.multipart = None;
        self.store.clear();
    }

    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request<Bytes> {
        &mut self.request
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    pub(crate) fn take_response(&mut self) -> Response {
        std::mem::take(&mut self.response)
    }

    /// The registered pattern of the matched route, e.g. `/users/:id`; empty when nothing matched.
    pub fn path(&self) -> &str {
        self.route.as_ref().map_or("", |route| route.path())
    }

    pub fn route(&self) -> Option<&Arc<Route>> {
        self.route.as_ref()
    }

    /// The handler of the matched route.
    pub fn handler(&self) -> Option<&HandlerRef> {
        self.route.as_ref().map(|route| route.handler())
    }

    /// Whether the owning server runs in debug mode.
    pub fn debug(&self) -> bool {
        self.shared.debug
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    pub fn set_param_names<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.param_names = names.into_iter().map(Into::into).collect::<Vec<_>>().into();
    }

    pub fn param_values(&self) -> &[String] {
        &self.param_values[..self.param_len]
    }

    pub fn set_param_values<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.param_len = 0;
        for value in values {
            self.push_param(value.as_ref());
        }
    }

    /// Gets the value of the path parameter `name`, or an empty string when it is not bound.
    pub fn param(&self, name: &str) -> &str {
        self.param_names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.param_values().get(i))
            .map_or("", String::as_str)
    }

    /// Parses the path parameter `name` as an integer.
    ///
    /// An absent or non numeric parameter yields `0`, it is never an error.
    pub fn int_param(&self, name: &str) -> i64 {
        self.param(name).parse().unwrap_or(0)
    }

    /// Stores `value` under `key` for later handlers and middleware of this request.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Any + Send + Sync,
    {
        self.store.insert(key.into(), Box::new(value));
    }

    /// Gets the value stored under `key` if it has type `V`.
    pub fn get<V: Any>(&self, key: &str) -> Option<&V> {
        self.store.get(key).and_then(|value| value.downcast_ref::<V>())
    }

    /// Removes the value stored under `key`, returning whether there was one.
    pub fn remove(&mut self, key: &str) -> bool {
        self.store.remove(key).is_some()
    }

    /// Hands `err` to the server's error handler, which writes the client visible response.
    pub fn error(&mut self, err: Error) {
        let error_handler = Arc::clone(&self.shared.error_handler);
        error_handler.handle(err, self);
    }

    /// The scheme the client used, honoring the usual reverse proxy headers.
    pub fn scheme(&self) -> &str {
        if self.request.uri().scheme_str() == Some("https") {
            return "https";
        }

        let headers = self.request.headers();
        let header = |name: &HeaderName| headers.get(name).and_then(|value| value.to_str().ok());
        if let Some(scheme) = header(&X_FORWARDED_PROTO).or_else(|| header(&X_FORWARDED_PROTOCOL)) {
            return scheme;
        }
        if header(&X_FORWARDED_SSL) == Some("on") {
            return "https";
        }
        header(&X_URL_SCHEME).unwrap_or("http")
    }

    pub fn is_tls(&self) -> bool {
        self.scheme() == "https"
    }

    pub fn is_websocket(&self) -> bool {
        let headers = self.request.headers();
        let upgrade = headers.get(UPGRADE).and_then(|v| v.to_str().ok()).is_some_and(|v| v.eq_ignore_ascii_case("websocket"));
        let connection = headers
            .get(CONNECTION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.split(',').any(|token| token.trim().eq_ignore_ascii_case("upgrade")));
        upgrade && connection
    }

    /// The client address: `X-Forwarded-For`, then `X-Real-IP`, then the peer
    /// address the transport stored in the request extensions.
    pub fn real_ip(&self) -> String {
        let headers = self.request.headers();
        if let Some(forwarded) = headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            if let Some(first) = forwarded.split(',').map(str::trim).find(|ip| !ip.is_empty()) {
                return first.to_owned();
            }
        }
        if let Some(real_ip) = headers.get(X_REAL_IP).and_then(|v| v.to_str().ok()) {
            return real_ip.to_owned();
        }
        self.request.extensions().get::<SocketAddr>().map(|addr| addr.ip().to_string()).unwrap_or_default()
    }
}

impl ParamSink for Context {
    fn param_len(&self) -> usize {
        self.param_len
    }

    fn push_param(&mut self, value: &str) {
        match self.param_values.get_mut(self.param_len) {
            Some(slot) => {
                slot.clear();
                slot.push_str(value);
            }
            None => self.param_values.push(value.to_owned()),
        }
        self.param_len += 1;
    }

    fn truncate_params(&mut self, len: usize) {
        self.param_len = self.param_len.min(len);
    }

    fn bind_route(&mut self, route: &Arc<Route>) {
        self.param_names = Arc::clone(route.param_names());
        self.route = Some(Arc::clone(route));
    }

    fn clear_route(&mut self) {
        self.param_names = Arc::clone(&NO_PARAM_NAMES);
        self.route = None;
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", self.request.method())
            .field("uri", self.request.uri())
            .field("path", &self.path())
            .field("param_names", &self.param_names())
            .field("param_values", &self.param_values())
            .field("committed", &self.response.committed())
            .finish_non_exhaustive()
    }
}
