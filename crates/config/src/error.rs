//! Typed error type for the config crate.

use thiserror::Error;

/// Boxed transport-level error produced by a parameter store backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The batch fetch against the parameter store failed (transport,
    /// permissions, throttling). Fatal; there is no built-in retry.
    #[error("parameter store request failed: {0}")]
    ParameterStore(#[source] BoxError),

    /// A requested parameter was absent (or empty) in the response.
    #[error("parameter store response is missing '{0}'")]
    MissingParameter(&'static str),

    /// The port value could not be parsed into a non-zero u16.
    #[error("invalid port value '{value}'")]
    InvalidPort { value: String },
}
