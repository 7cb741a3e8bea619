//! Configuration error types.

use std::path::PathBuf;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration error type.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file could not be deserialized.
    #[error("Failed to parse {format} config: {message}")]
    Parse {
        /// Format name.
        format: &'static str,
        /// Parser message.
        message: String,
    },

    /// A value is out of range or inconsistent.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create an invalid-configuration error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

impl From<ConfigError> for gateway_core::GatewayError {
    fn from(err: ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}
