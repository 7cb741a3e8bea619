//! # Gateway Store
//!
//! Storage for the provider registry, the append-only call log and the
//! provider audit trail.
//!
//! This crate provides:
//! - In-memory stores for tests and ephemeral runs
//! - A SQLite store with an idempotent schema bootstrap
//!
//! ## Example
//!
//! ```rust,no_run
//! use gateway_store::{PoolConfig, SqliteStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SqliteStore::connect("sqlite://gateway.db", &PoolConfig::default()).await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod memory;
pub mod pool;
pub mod schema;
pub mod sqlite;

pub use error::{Result, StoreError};
pub use memory::{InMemoryAuditLog, InMemoryCallLog, InMemoryProviderStore};
pub use pool::{PoolConfig, PoolConfigBuilder};
pub use sqlite::SqliteStore;

/// Re-export sqlx types for convenience
pub use sqlx;
