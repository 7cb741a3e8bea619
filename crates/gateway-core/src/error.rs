//! Error types for the gateway.

use crate::types::ProviderId;
use thiserror::Error;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Gateway-level errors.
///
/// Provider failures are not represented here: adapters turn them into
/// failed [`ProviderResult`](crate::ProviderResult) values and the router
/// reports exhausted chains as a failed
/// [`FallbackResponse`](crate::FallbackResponse).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Unknown provider family string
    #[error("Unsupported provider type: {provider_type}")]
    UnsupportedProviderType {
        /// The offending family string
        provider_type: String,
    },

    /// Invalid gateway configuration
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// Invalid input value
    #[error("Validation error: {message}")]
    Validation {
        /// Error message
        message: String,
        /// Field that failed validation
        field: Option<String>,
    },

    /// A provider with this display name already exists
    #[error("Provider name exists: {name}")]
    DuplicateProviderName {
        /// Conflicting name
        name: String,
    },

    /// No provider with this identifier
    #[error("Provider not found: {id}")]
    ProviderNotFound {
        /// Requested identifier
        id: ProviderId,
    },

    /// Registry or call log storage failed
    #[error("Storage error: {message}")]
    Storage {
        /// Error message
        message: String,
    },

    /// Unexpected internal failure
    #[error("Internal error: {message}")]
    Internal {
        /// Error message
        message: String,
    },
}

impl GatewayError {
    /// Create an unsupported provider type error
    pub fn unsupported_provider_type(provider_type: impl Into<String>) -> Self {
        Self::UnsupportedProviderType {
            provider_type: provider_type.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>, field: Option<&str>) -> Self {
        Self::Validation {
            message: message.into(),
            field: field.map(str::to_string),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Failure talking to an upstream provider.
///
/// Only ever seen inside adapters; its display form becomes the
/// `error` of a failed [`ProviderResult`](crate::ProviderResult).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// Network-level failure (connect, TLS, timeout, body read)
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx HTTP status
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Upstream error message or raw body
        message: String,
    },

    /// 2xx response whose body did not have the expected shape
    #[error("unexpected response shape: {0}")]
    Shape(String),
}

impl UpstreamError {
    /// Build a status error, preferring the `{"error":{"message":..}}`
    /// text when the body carries one.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .and_then(|e| e.get("message").or(Some(e)))
                    .and_then(|m| m.as_str().map(str::to_string))
            })
            .unwrap_or_else(|| body.trim().to_string());
        Self::Status { status, message }
    }
}
