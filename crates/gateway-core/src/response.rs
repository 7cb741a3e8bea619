//! Result types returned by adapters and by the router.

use crate::types::ProviderId;
use serde::{Deserialize, Serialize};

/// Outcome of a single adapter call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderResult {
    /// Whether the call succeeded
    pub ok: bool,
    /// Returned text (empty on failure)
    pub content: String,
    /// Wall-clock latency of the network call
    pub latency_ms: u64,
    /// Failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderResult {
    /// Successful result
    pub fn success(content: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            ok: true,
            content: content.into(),
            latency_ms,
            error: None,
        }
    }

    /// Failed result
    pub fn failure(error: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            ok: false,
            content: String::new(),
            latency_ms,
            error: Some(error.into()),
        }
    }
}

/// Result of a fallback-chain call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackResponse {
    /// Whether any provider succeeded
    pub ok: bool,
    /// Content of the successful call
    pub content: String,
    /// Provider that answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<ProviderId>,
    /// Attempt number (1-based) that answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u32>,
    /// Terminal failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FallbackResponse {
    /// Terminal reason when no provider is enabled
    pub const NO_ENABLED_PROVIDERS: &'static str = "no enabled providers";
    /// Terminal reason when the whole chain failed
    pub const ALL_PROVIDERS_FAILED: &'static str = "all providers failed";
    /// Terminal reason when the request deadline fired
    pub const DEADLINE_EXCEEDED: &'static str = "request deadline exceeded";

    /// Successful response
    pub fn success(content: impl Into<String>, provider_id: ProviderId, attempt: u32) -> Self {
        Self {
            ok: true,
            content: content.into(),
            provider_id: Some(provider_id),
            attempt: Some(attempt),
            error: None,
        }
    }

    /// Failed response
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            content: String::new(),
            provider_id: None,
            attempt: None,
            error: Some(error.into()),
        }
    }
}

/// Result of an administrative health check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckReport {
    /// Checked provider
    pub provider_id: ProviderId,
    /// Reachable or not
    pub ok: bool,
    /// Error text on failure, check content otherwise
    pub detail: String,
    /// Check latency
    pub latency_ms: u64,
}

impl HealthCheckReport {
    /// Build a report from a health check result
    #[must_use]
    pub fn from_result(provider_id: ProviderId, result: ProviderResult) -> Self {
        Self {
            provider_id,
            ok: result.ok,
            detail: result.error.unwrap_or(result.content),
            latency_ms: result.latency_ms,
        }
    }
}
