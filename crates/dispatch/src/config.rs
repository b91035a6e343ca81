use serde::Deserialize;

/// Server settings, deserializable from any serde format.
///
/// Missing fields take their default value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Expose error details in `500` responses.
    pub debug: bool,
    /// Upper bound of idle contexts kept for reuse.
    pub pool_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { debug: false, pool_capacity: 64 }
    }
}
