//! The request dispatch core of micro web.
//!
//! A [`Router`] resolves `(method, path)` pairs against registered patterns
//! with static, `:param` and `*catch-all` segments. The [`Server`] binds the
//! matched route and its parameters to a pooled [`Context`], runs the handler,
//! and hands any error to the configured [`ErrorHandler`].
//!
//! # Example
//! ```
//! use bytes::Bytes;
//! use http::{Method, Request, StatusCode};
//! use micro_dispatch::{handler_fn, Router, Server};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut router = Router::new();
//! router
//!     .get(
//!         "/users/:id",
//!         handler_fn(|ctx| {
//!             Box::pin(async move {
//!                 let id = ctx.int_param("id");
//!                 ctx.json(StatusCode::OK, &serde_json::json!({ "id": id }))
//!             })
//!         }),
//!     )
//!     .unwrap();
//!
//! let server = Server::builder().router(router).build().unwrap();
//! let request = Request::builder().method(Method::GET).uri("/users/7").body(Bytes::new()).unwrap();
//! let response = server.dispatch(request).await;
//! assert_eq!(response.status(), StatusCode::OK);
//! # }
//! ```

mod body;
mod config;
mod context;
mod error;
mod error_handler;
mod handler;
mod pool;
mod renderer;
mod response;
mod server;

pub mod mime_types;
pub mod router;

pub use body::ResponseBody;
pub use config::Config;
pub use context::{Context, FileHeader, MultipartForm, Values, DEFAULT_INDENT, XML_HEADER};
pub use error::{BoxError, Error, HttpError, RouteError};
pub use error_handler::{DefaultErrorHandler, ErrorHandler};
pub use handler::{handler_fn, FnHandler, Handler, HandlerRef};
pub use pool::ContextPool;
pub use renderer::Renderer;
pub use response::Response;
pub use router::{Captures, ParamSink, Route, Router};
pub use server::{init_tracing, Server, ServerBuildError, ServerBuilder};
