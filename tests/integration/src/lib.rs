//! Integration tests for the meal advisor gateway
//!
//! These run the real HTTP adapters against wiremock servers, backed by
//! the in-memory and SQLite stores:
//! - Adapter wire formats
//! - Fallback routing and retries
//! - Log-derived circuit breaking
//! - SQLite persistence
//! - Recommendation end to end

pub mod fixtures;
pub mod helpers;
pub mod mock_providers;

// Re-export commonly used items
pub use fixtures::*;
pub use helpers::*;
pub use mock_providers::*;

#[cfg(test)]
mod circuit_tests;
#[cfg(test)]
mod e2e_tests;
#[cfg(test)]
mod provider_tests;
#[cfg(test)]
mod routing_tests;
#[cfg(test)]
mod store_tests;
