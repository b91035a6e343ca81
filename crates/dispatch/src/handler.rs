//! Request handlers invoked once a route has been resolved.
//!
//! A handler receives the request [`Context`] mutably: it reads parameters and
//! request data from it and writes the response through it.

use crate::context::Context;
use crate::error::Error;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, ctx: &mut Context) -> Result<(), Error>;
}

/// Shared reference to a registered handler, cloned into each context that resolves to it.
pub type HandlerRef = Arc<dyn Handler>;

/// a closure holder which represents any handler written as `|ctx| Box::pin(async move { .. })`
pub struct FnHandler<F> {
    f: F,
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

/// Adapts a closure into a [`Handler`].
///
/// # Example
/// ```
/// use http::StatusCode;
/// use micro_dispatch::handler_fn;
///
/// let hello = handler_fn(|ctx| Box::pin(async move { ctx.string(StatusCode::OK, "hello") }));
/// # let _ = hello;
/// ```
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: for<'c> Fn(&'c mut Context) -> BoxFuture<'c, Result<(), Error>> + Send + Sync,
{
    FnHandler { f }
}

#[async_trait]
impl<F> Handler for FnHandler<F>
where
    F: for<'c> Fn(&'c mut Context) -> BoxFuture<'c, Result<(), Error>> + Send + Sync,
{
    async fn call(&self, ctx: &mut Context) -> Result<(), Error> {
        (self.f)(ctx).await
    }
}
