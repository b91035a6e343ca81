//! Path router: one segment trie per HTTP method.
//!
//! Patterns are registered once at startup with [`Router::add`] (or one of the
//! per-method shorthands) and the router is read only afterwards, so it can be
//! shared by every request without locking.
//!
//! Three segment kinds are supported:
//! - static `users`: matches the literal segment
//! - param `:id`: captures exactly one segment
//! - catch-all `*path`: captures the rest of the path, must be the last segment
//!
//! When several routes could match one path, static beats param and param
//! beats catch-all, whatever the registration order was.
//!
//! # Examples
//!
//! ```
//! use http::Method;
//! use micro_dispatch::router::{Captures, Router};
//! use micro_dispatch::handler_fn;
//!
//! let mut router = Router::new();
//! router.get("/users/:id", handler_fn(|_ctx| Box::pin(async move { Ok(()) }))).unwrap();
//!
//! let mut captures = Captures::new();
//! assert!(router.find(&Method::GET, "/users/1", &mut captures));
//! assert_eq!(captures.get("id"), Some("1"));
//! ```

mod node;
mod pattern;

use crate::error::RouteError;
use crate::handler::{Handler, HandlerRef};
use http::Method;
use node::Node;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Methods registered by [`Router::any`].
const ANY_METHODS: [Method; 9] = [
    Method::CONNECT,
    Method::DELETE,
    Method::GET,
    Method::HEAD,
    Method::OPTIONS,
    Method::PATCH,
    Method::POST,
    Method::PUT,
    Method::TRACE,
];

/// A registered route: method, display pattern, parameter names and handler.
pub struct Route {
    method: Method,
    path: String,
    param_names: Arc<[String]>,
    handler: HandlerRef,
}

impl Route {
    pub(crate) fn new(method: Method, path: &str, param_names: Vec<String>, handler: HandlerRef) -> Self {
        Self { method, path: path.to_owned(), param_names: param_names.into(), handler }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The pattern as it was registered, e.g. `/users/:id`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Parameter names in declaration order.
    pub fn param_names(&self) -> &Arc<[String]> {
        &self.param_names
    }

    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("param_names", &self.param_names)
            .finish_non_exhaustive()
    }
}

/// Target of [`Router::find`]: receives parameter values and the resolved route.
///
/// Values are pushed in path order, which is also the declaration order of the
/// names in the matched pattern. A lookup may push values for a branch it later
/// abandons, in which case it truncates them away again.
pub trait ParamSink {
    /// Number of values currently bound.
    fn param_len(&self) -> usize;

    fn push_param(&mut self, value: &str);

    fn truncate_params(&mut self, len: usize);

    /// Called once the lookup succeeded, after every value was pushed.
    fn bind_route(&mut self, route: &Arc<Route>);

    /// Forgets the route bound by an earlier lookup.
    fn clear_route(&mut self);
}

/// A standalone [`ParamSink`] for lookups made outside of a request context.
#[derive(Debug, Default, Clone)]
pub struct Captures {
    route: Option<Arc<Route>>,
    values: Vec<String>,
}

impl Captures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self) -> Option<&Arc<Route>> {
        self.route.as_ref()
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Gets the value bound to the parameter `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        let names = self.route.as_ref()?.param_names();
        names.iter().position(|n| n == name).and_then(|i| self.values.get(i)).map(String::as_str)
    }
}

impl ParamSink for Captures {
    fn param_len(&self) -> usize {
        self.values.len()
    }

    fn push_param(&mut self, value: &str) {
        self.values.push(value.to_owned());
    }

    fn truncate_params(&mut self, len: usize) {
        self.values.truncate(len);
    }

    fn bind_route(&mut self, route: &Arc<Route>) {
        self.route = Some(Arc::clone(route));
    }

    fn clear_route(&mut self) {
        self.route = None;
    }
}

#[derive(Default)]
pub struct Router {
    trees: HashMap<Method, Node>,
    routes: Vec<Arc<Route>>,
    max_params: usize,
}

macro_rules! method_route {
    ($name:ident, $method:ident) => {
        #[doc = concat!("Registers `handler` for `", stringify!($method), "` requests matching `pattern`.")]
        pub fn $name<H: Handler + 'static>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
            self.add(Method::$method, pattern, handler)
        }
    };
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `method` requests whose path matches `pattern`.
    ///
    /// Registering the same concrete shape twice for one method replaces the
    /// earlier handler; `/users/:id` and `/users/:name` are the same shape.
    ///
    /// # Errors
    /// Returns a [`RouteError`] when the pattern is malformed.
    pub fn add<H: Handler + 'static>(
        &mut self,
        method: Method,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, RouteError> {
        self.add_ref(method, pattern, Arc::new(handler))
    }

    /// Same as [`Router::add`] for a handler that is already shared.
    ///
    /// # Errors
    /// Returns a [`RouteError`] when the pattern is malformed.
    pub fn add_ref(&mut self, method: Method, pattern: &str, handler: HandlerRef) -> Result<&mut Self, RouteError> {
        let pattern::Pattern { segments, names } = pattern::parse(pattern)?;
        self.max_params = self.max_params.max(names.len());

        let route = Arc::new(Route::new(method.clone(), pattern, names, handler));
        let root = self.trees.entry(method).or_insert_with(Node::root);

        match root.insert(&segments, Arc::clone(&route)) {
            Some(previous) => {
                warn!(method = %route.method, path = %route.path, replaced = %previous.path, "route replaced");
                match self.routes.iter_mut().find(|r| Arc::ptr_eq(r, &previous)) {
                    Some(slot) => *slot = route,
                    None => self.routes.push(route),
                }
            }
            None => {
                debug!(method = %route.method, path = %route.path, "route registered");
                self.routes.push(route);
            }
        }
        Ok(self)
    }

    /// Registers `handler` for every standard method.
    ///
    /// # Errors
    /// Returns a [`RouteError`] when the pattern is malformed.
    pub fn any<H: Handler + 'static>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
        let handler: HandlerRef = Arc::new(handler);
        for method in &ANY_METHODS {
            self.add_ref(method.clone(), pattern, Arc::clone(&handler))?;
        }
        Ok(self)
    }

    method_route!(get, GET);
    method_route!(post, POST);
    method_route!(put, PUT);
    method_route!(delete, DELETE);
    method_route!(patch, PATCH);
    method_route!(head, HEAD);
    method_route!(options, OPTIONS);
    method_route!(connect, CONNECT);
    method_route!(trace, TRACE);

    /// Resolves `method` and `path`, writing parameter values and the route into `sink`.
    ///
    /// Returns `false` when nothing matches; the sink then holds no values and no route.
    pub fn find<S>(&self, method: &Method, path: &str, sink: &mut S) -> bool
    where
        S: ParamSink + ?Sized,
    {
        sink.truncate_params(0);
        sink.clear_route();
        let Some(root) = self.trees.get(method) else {
            return false;
        };

        match root.find(path, sink) {
            Some(route) => {
                sink.bind_route(route);
                true
            }
            None => {
                sink.truncate_params(0);
                sink.clear_route();
                false
            }
        }
    }

    /// Lists the methods having a route that matches `path`, sorted by name.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut probe = Captures::new();
        let mut methods: Vec<Method> = self
            .trees
            .iter()
            .filter(|(_, root)| {
                probe.truncate_params(0);
                root.find(path, &mut probe).is_some()
            })
            .map(|(method, _)| method.clone())
            .collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    /// Every registered route, in registration order.
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// The largest parameter count over all registered routes.
    pub fn max_params(&self) -> usize {
        self.max_params
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.trees.iter().collect();
        methods.sort_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()));
        for (method, root) in methods {
            writeln!(f, "{method}")?;
            write!(f, "{root:?}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Captures, Router};
    use crate::error::RouteError;
    use crate::handler::handler_fn;
    use http::Method;

    fn router(paths: &[&str]) -> Router {
        let mut router = Router::new();
        for path in paths {
            router.get(path, handler_fn(|_ctx| Box::pin(async move { Ok(()) }))).unwrap();
        }
        router
    }

    fn find<'c>(router: &Router, path: &str, captures: &'c mut Captures) -> Option<&'c str> {
        if router.find(&Method::GET, path, captures) {
            captures.route().map(|route| route.path())
        } else {
            None
        }
    }

    #[test]
    fn test_static() {
        let router = router(&["/", "/users", "/users/new"]);
        let mut captures = Captures::new();

        assert_eq!(find(&router, "/", &mut captures), Some("/"));
        assert_eq!(find(&router, "/users", &mut captures), Some("/users"));
        assert_eq!(find(&router, "/users/new", &mut captures), Some("/users/new"));
        assert!(captures.values().is_empty());
        assert_eq!(find(&router, "/users/old", &mut captures), None);
    }

    #[test]
    fn test_param() {
        let router = router(&["/users/:id"]);
        let mut captures = Captures::new();

        assert_eq!(find(&router, "/users/1", &mut captures), Some("/users/:id"));
        assert_eq!(captures.get("id"), Some("1"));
        assert_eq!(find(&router, "/users", &mut captures), None);
        assert_eq!(find(&router, "/users/1/files", &mut captures), None);
    }

    #[test]
    fn test_overlapping_params() {
        let router = router(&["/users/:id", "/users/:uid/files/:fid"]);
        let mut captures = Captures::new();

        assert_eq!(find(&router, "/users/1", &mut captures), Some("/users/:id"));
        assert_eq!(captures.get("id"), Some("1"));
        assert_eq!(captures.get("uid"), None);

        assert_eq!(find(&router, "/users/1/files/2", &mut captures), Some("/users/:uid/files/:fid"));
        assert_eq!(captures.get("uid"), Some("1"));
        assert_eq!(captures.get("fid"), Some("2"));
        assert_eq!(captures.get("id"), None);
    }

    #[test]
    fn test_catch_all() {
        let router = router(&["/static/*filepath", "/*"]);
        let mut captures = Captures::new();

        assert_eq!(find(&router, "/static/css/app.css", &mut captures), Some("/static/*filepath"));
        assert_eq!(captures.get("filepath"), Some("css/app.css"));

        assert_eq!(find(&router, "/static", &mut captures), Some("/static/*filepath"));
        assert_eq!(captures.get("filepath"), Some(""));

        assert_eq!(find(&router, "/anything/else", &mut captures), Some("/*"));
        assert_eq!(captures.get("*"), Some("anything/else"));
    }

    #[test]
    fn test_precedence_ignores_registration_order() {
        let orders: [[&str; 3]; 3] = [
            ["/files/*path", "/files/:name", "/files/readme"],
            ["/files/readme", "/files/:name", "/files/*path"],
            ["/files/:name", "/files/*path", "/files/readme"],
        ];

        for order in orders {
            let router = router(&order);
            let mut captures = Captures::new();

            assert_eq!(find(&router, "/files/readme", &mut captures), Some("/files/readme"));
            assert_eq!(find(&router, "/files/license", &mut captures), Some("/files/:name"));
            assert_eq!(captures.get("name"), Some("license"));
            assert_eq!(find(&router, "/files/docs/guide.md", &mut captures), Some("/files/*path"));
            assert_eq!(captures.get("path"), Some("docs/guide.md"));
        }
    }

    #[test]
    fn test_failed_find_clears_route() {
        let router = router(&["/users/:id"]);
        let mut captures = Captures::new();

        assert_eq!(find(&router, "/users/1", &mut captures), Some("/users/:id"));
        assert!(!router.find(&Method::GET, "/nope", &mut captures));
        assert!(captures.route().is_none());
        assert!(captures.values().is_empty());
        assert_eq!(captures.get("id"), None);

        assert_eq!(find(&router, "/users/1", &mut captures), Some("/users/:id"));
        assert!(!router.find(&Method::POST, "/users/1", &mut captures));
        assert!(captures.route().is_none());
    }

    #[test]
    fn test_method_isolation() {
        let mut router = router(&["/items"]);
        router.post("/items/:id", handler_fn(|_ctx| Box::pin(async move { Ok(()) }))).unwrap();
        let mut captures = Captures::new();

        assert!(router.find(&Method::GET, "/items", &mut captures));
        assert!(!router.find(&Method::GET, "/items/1", &mut captures));
        assert!(router.find(&Method::POST, "/items/1", &mut captures));
        assert!(!router.find(&Method::PUT, "/items", &mut captures));
        assert!(captures.values().is_empty());
    }

    #[test]
    fn test_re_registration_replaces() {
        let router = router(&["/users/:id", "/users/:name"]);
        let mut captures = Captures::new();

        assert_eq!(router.routes().len(), 1);
        assert_eq!(find(&router, "/users/jon", &mut captures), Some("/users/:name"));
        assert_eq!(captures.get("name"), Some("jon"));
        assert_eq!(captures.get("id"), None);
    }

    #[test]
    fn test_any_and_allowed_methods() {
        let mut router = router(&["/users/:id"]);
        router.delete("/users/:id", handler_fn(|_ctx| Box::pin(async move { Ok(()) }))).unwrap();
        router.any("/ping", handler_fn(|_ctx| Box::pin(async move { Ok(()) }))).unwrap();

        assert_eq!(router.allowed_methods("/users/1"), vec![Method::DELETE, Method::GET]);
        assert_eq!(router.allowed_methods("/ping").len(), 9);
        assert!(router.allowed_methods("/nothing").is_empty());
    }

    #[test]
    fn test_max_params() {
        let router = router(&["/", "/a/:x", "/a/:x/b/:y/*rest"]);
        assert_eq!(router.max_params(), 3);
    }

    #[test]
    fn test_registration_errors() {
        let mut router = Router::new();
        let result = router.get("/static/*path/more", handler_fn(|_ctx| Box::pin(async move { Ok(()) })));
        assert_eq!(result.err(), Some(RouteError::catch_all_not_last("/static/*path/more")));
        assert!(router.routes().is_empty());
    }

    #[test]
    fn test_empty_segments_are_ignored() {
        let router = router(&["/users/:id"]);
        let mut captures = Captures::new();

        assert_eq!(find(&router, "//users//7/", &mut captures), Some("/users/:id"));
        assert_eq!(captures.get("id"), Some("7"));
    }
}
