//! Store error types.

use gateway_core::{GatewayError, ProviderId};

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Store error type.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connection(String),

    /// SQL execution error.
    #[error("SQL execution error: {0}")]
    Execution(String),

    /// A stored row could not be decoded.
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Unique provider name violated.
    #[error("Provider name exists: {name}")]
    DuplicateName {
        /// Conflicting name.
        name: String,
    },

    /// Provider row missing.
    #[error("Provider not found: {id}")]
    NotFound {
        /// Requested identifier.
        id: ProviderId,
    },

    /// Rejected input.
    #[error(transparent)]
    Invalid(GatewayError),

    /// Pool error.
    #[error("Connection pool error: {0}")]
    Pool(String),
}

impl StoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a corrupt-row error.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(e) => Self::Connection(e.to_string()),
            sqlx::Error::PoolTimedOut => Self::Pool("Connection pool timed out".to_string()),
            sqlx::Error::PoolClosed => Self::Pool("Connection pool is closed".to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
                Self::Corrupt(err.to_string())
            }
            _ => Self::Execution(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateName { name } => Self::DuplicateProviderName { name },
            StoreError::NotFound { id } => Self::ProviderNotFound { id },
            StoreError::Invalid(inner) => inner,
            other => Self::storage(other.to_string()),
        }
    }
}
