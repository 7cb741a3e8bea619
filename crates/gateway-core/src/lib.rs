//! # Gateway Core
//!
//! Core types, traits, and error handling for the meal advisor LLM gateway.
//!
//! This crate provides the foundational types used throughout the gateway:
//! - Provider configuration and the provider adapter contract
//! - Request/result types exchanged with adapters
//! - Call log entries and the store traits the router reads and writes
//! - Audit records of provider administration
//! - Error types and handling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
pub mod call_log;
pub mod error;
pub mod provider;
pub mod request;
pub mod response;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use audit::{clamp_audit_limit, AuditAction, AuditEntry, NewAuditEntry, AUDIT_LIST_MAX};
pub use call_log::{CallLogEntry, CallStatus, NewCallLogEntry};
pub use error::{GatewayError, GatewayResult, UpstreamError};
pub use provider::{
    normalize_base_url, AdapterFactory, ModelMap, NewProviderConfig, ProviderAdapter,
    ProviderConfig, ProviderConfigUpdate, ProviderKind, DEFAULT_PRIORITY, FALLBACK_MODEL,
};
pub use request::{append_image_hints, ProviderRequest, DEFAULT_TEMPERATURE};
pub use response::{FallbackResponse, HealthCheckReport, ProviderResult};
pub use store::{AuditLogStore, CallLogStore, ProviderStore};
pub use types::{ProviderId, TaskType};
