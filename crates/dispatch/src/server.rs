//! The server facade: owns the router, the collaborators shared by every
//! context, and the context pool, and drives one request through them.

use crate::body::ResponseBody;
use crate::config::Config;
use crate::context::Context;
use crate::error::{Error, HttpError};
use crate::error_handler::{DefaultErrorHandler, ErrorHandler};
use crate::pool::ContextPool;
use crate::renderer::Renderer;
use crate::response::Response;
use crate::router::Router;
use bytes::Bytes;
use futures::FutureExt;
use http::header::{HeaderValue, ALLOW};
use http::{Method, Request};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Collaborators every context of a server can reach.
pub(crate) struct Shared {
    pub(crate) renderer: Option<Arc<dyn Renderer>>,
    pub(crate) error_handler: Arc<dyn ErrorHandler>,
    pub(crate) debug: bool,
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared")
            .field("renderer", &self.renderer.is_some())
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

pub struct ServerBuilder {
    router: Option<Router>,
    renderer: Option<Arc<dyn Renderer>>,
    error_handler: Option<Arc<dyn ErrorHandler>>,
    config: Config,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { router: None, renderer: None, error_handler: None, config: Config::default() }
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    pub fn error_handler(mut self, error_handler: impl ErrorHandler + 'static) -> Self {
        self.error_handler = Some(Arc::new(error_handler));
        self
    }

    /// Replaces the whole configuration; later `debug` or `pool_capacity` calls still apply.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    pub fn pool_capacity(mut self, capacity: usize) -> Self {
        self.config.pool_capacity = capacity;
        self
    }

    /// # Errors
    /// Returns [`ServerBuildError::MissingRouter`] when no router was set.
    pub fn build(self) -> Result<Server, ServerBuildError> {
        let router = self.router.ok_or(ServerBuildError::MissingRouter)?;
        let error_handler = self.error_handler.unwrap_or_else(|| Arc::new(DefaultErrorHandler));
        let shared = Arc::new(Shared { renderer: self.renderer, error_handler, debug: self.config.debug });
        Ok(Server { router, shared, pool: ContextPool::new(self.config.pool_capacity) })
    }
}

impl fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerBuilder").field("router", &self.router).field("config", &self.config).finish_non_exhaustive()
    }
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("router must be set")]
    MissingRouter,
}

pub struct Server {
    router: Router,
    shared: Arc<Shared>,
    pool: ContextPool,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn debug(&self) -> bool {
        self.shared.debug
    }

    pub fn pool(&self) -> &ContextPool {
        &self.pool
    }

    /// Creates a context bound to this server, with parameter slots for the largest route.
    pub fn new_context(&self, request: Request<Bytes>, response: Response) -> Context {
        Context::new(request, response, Arc::clone(&self.shared), self.router.max_params())
    }

    /// Runs one request through routing, its handler and the error handler.
    ///
    /// An unmatched path yields `404`, a path registered only for other
    /// methods yields `405` with an `Allow` header, and a panicking handler
    /// yields `500`. The context goes back to the pool afterwards.
    pub async fn dispatch(&self, request: Request<Bytes>) -> http::Response<ResponseBody> {
        let method = request.method().clone();
        let path = request.uri().path().to_owned();

        let mut ctx = match self.pool.acquire() {
            Some(mut ctx) => {
                ctx.reset(request, Response::new());
                ctx
            }
            None => self.new_context(request, Response::new()),
        };

        let handler = if self.router.find(&method, &path, &mut ctx) { ctx.handler().map(Arc::clone) } else { None };
        let result = match handler {
            Some(handler) => match AssertUnwindSafe(handler.call(&mut ctx)).catch_unwind().await {
                Ok(result) => result,
                Err(_) => {
                    error!(%method, path = path.as_str(), "handler panicked");
                    Err(HttpError::internal().into())
                }
            },
            None => Err(self.unmatched(&method, &path, &mut ctx)),
        };

        if let Err(err) = result {
            ctx.error(err);
        }

        let response = ctx.take_response();
        self.pool.release(ctx);
        response.into_http()
    }

    fn unmatched(&self, method: &Method, path: &str, ctx: &mut Context) -> Error {
        let allowed = self.router.allowed_methods(path);
        if allowed.is_empty() {
            debug!(%method, path, "no route matched");
            return HttpError::not_found().into();
        }

        debug!(%method, path, ?allowed, "method not allowed");
        let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
        match HeaderValue::from_str(&allow) {
            Ok(value) => {
                ctx.response_mut().headers_mut().insert(ALLOW, value);
            }
            Err(e) => warn!(cause = %e, "invalid Allow header"),
        }
        HttpError::method_not_allowed().into()
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server").field("router", &self.router).field("shared", &self.shared).field("pool", &self.pool).finish()
    }
}

/// Installs a global `tracing` fmt subscriber at `level`; later calls keep the first subscriber.
pub fn init_tracing(level: Level) {
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        debug!(cause = %e, "global subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::{Server, ServerBuildError};
    use crate::error::HttpError;
    use crate::error_handler::MockErrorHandler;
    use crate::handler::handler_fn;
    use crate::router::Router;
    use crate::Config;
    use bytes::Bytes;
    use http::header::ALLOW;
    use http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;

    fn request(method: Method, uri: &str) -> Request<Bytes> {
        Request::builder().method(method).uri(uri).body(Bytes::new()).unwrap()
    }

    async fn body_string(response: http::Response<crate::ResponseBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn router() -> Router {
        let mut router = Router::new();
        router
            .get(
                "/users/:id",
                handler_fn(|ctx| {
                    Box::pin(async move {
                        let body = format!("user {}", ctx.param("id"));
                        ctx.string(StatusCode::OK, &body)
                    })
                }),
            )
            .unwrap()
            .post("/users", handler_fn(|ctx| Box::pin(async move { ctx.no_content(StatusCode::CREATED) })))
            .unwrap()
            .get(
                "/bad",
                handler_fn(|_ctx| Box::pin(async move { Err(HttpError::new(StatusCode::BAD_REQUEST, "bad id").into()) })),
            )
            .unwrap()
            .get(
                "/panic",
                handler_fn(|ctx| {
                    Box::pin(async move {
                        assert!(ctx.param_values().len() > 1, "boom");
                        Ok(())
                    })
                }),
            )
            .unwrap();
        router
    }

    #[test]
    fn build_requires_router() {
        assert!(matches!(Server::builder().build(), Err(ServerBuildError::MissingRouter)));
    }

    #[test]
    fn build_applies_config() {
        let config = Config { debug: true, pool_capacity: 8 };
        let server = Server::builder().router(Router::new()).config(config).build().unwrap();
        assert!(server.debug());
        assert_eq!(server.pool().capacity(), 8);
    }

    #[tokio::test]
    async fn dispatch_matched_route() {
        let server = Server::builder().router(router()).build().unwrap();

        let response = server.dispatch(request(Method::GET, "/users/42?fields=name")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "user 42");

        let response = server.dispatch(request(Method::POST, "/users")).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn dispatch_not_found() {
        let server = Server::builder().router(router()).build().unwrap();

        let response = server.dispatch(request(Method::GET, "/teams/1")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(response).await, "Not Found");
    }

    #[tokio::test]
    async fn dispatch_method_not_allowed() {
        let server = Server::builder().router(router()).build().unwrap();

        let response = server.dispatch(request(Method::DELETE, "/users/1")).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET");
    }

    #[tokio::test]
    async fn handler_error_goes_through_error_handler() {
        let server = Server::builder().router(router()).build().unwrap();

        let response = server.dispatch(request(Method::GET, "/bad")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "bad id");
    }

    #[tokio::test]
    async fn panicking_handler_yields_500() {
        let server = Server::builder().router(router()).build().unwrap();

        let response = server.dispatch(request(Method::GET, "/panic")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = server.dispatch(request(Method::GET, "/users/7")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn pooled_context_does_not_leak() {
        let mut router = Router::new();
        router
            .get(
                "/login/:user",
                handler_fn(|ctx| {
                    Box::pin(async move {
                        let user = ctx.param("user").to_owned();
                        ctx.set("user", user);
                        ctx.no_content(StatusCode::OK)
                    })
                }),
            )
            .unwrap()
            .get(
                "/whoami",
                handler_fn(|ctx| {
                    Box::pin(async move {
                        let leaked = ctx.get::<String>("user").is_some() || !ctx.param_values().is_empty();
                        ctx.string(StatusCode::OK, if leaked { "leaked" } else { "clean" })
                    })
                }),
            )
            .unwrap();
        let server = Server::builder().router(router).pool_capacity(1).build().unwrap();

        let response = server.dispatch(request(Method::GET, "/login/jon")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(server.pool().len(), 1);

        let response = server.dispatch(request(Method::GET, "/whoami")).await;
        assert_eq!(body_string(response).await, "clean");
        assert_eq!(server.pool().len(), 1);
    }

    #[tokio::test]
    async fn custom_error_handler() {
        let mut error_handler = MockErrorHandler::new();
        error_handler.expect_handle().times(1).returning(|err, ctx| {
            assert_eq!(err.as_http().map(HttpError::status), Some(StatusCode::NOT_FOUND));
            ctx.string(StatusCode::IM_A_TEAPOT, "custom").unwrap();
        });
        let server = Server::builder().router(router()).error_handler(error_handler).build().unwrap();

        let response = server.dispatch(request(Method::GET, "/nowhere")).await;
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(body_string(response).await, "custom");
    }
}
