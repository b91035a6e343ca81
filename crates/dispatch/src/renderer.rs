use crate::context::Context;
use crate::error::BoxError;
use std::io;

/// A template engine hooked into [`Context::render`].
///
/// `data` is the handler's value converted to JSON, so any `Serialize` type can be rendered.
pub trait Renderer: Send + Sync {
    /// Renders the template `name` into `out`.
    ///
    /// # Errors
    /// Returns the engine's error when the template is unknown or fails to render.
    fn render(&self, out: &mut dyn io::Write, name: &str, data: &serde_json::Value, ctx: &Context) -> Result<(), BoxError>;
}
