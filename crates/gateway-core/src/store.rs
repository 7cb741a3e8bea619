//! Storage contracts for provider configuration, the call log and the
//! audit trail.

use crate::audit::{AuditEntry, NewAuditEntry};
use crate::call_log::{CallLogEntry, NewCallLogEntry};
use crate::error::GatewayResult;
use crate::provider::{NewProviderConfig, ProviderConfig, ProviderConfigUpdate};
use crate::types::{ProviderId, TaskType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Persistent provider configuration
#[async_trait]
pub trait ProviderStore: Send + Sync {
    /// Enabled providers, ascending by priority then id
    async fn list_enabled(&self) -> GatewayResult<Vec<ProviderConfig>>;

    /// Every provider, ascending by priority then id
    async fn list_all(&self) -> GatewayResult<Vec<ProviderConfig>>;

    /// Look up one provider
    async fn get(&self, id: ProviderId) -> GatewayResult<Option<ProviderConfig>>;

    /// Create a provider; names are unique
    async fn create(&self, config: NewProviderConfig) -> GatewayResult<ProviderConfig>;

    /// Apply a partial update
    async fn update(
        &self,
        id: ProviderId,
        update: ProviderConfigUpdate,
    ) -> GatewayResult<ProviderConfig>;
}

/// Append-only attempt log
#[async_trait]
pub trait CallLogStore: Send + Sync {
    /// Append one entry
    async fn append(&self, entry: NewCallLogEntry) -> GatewayResult<CallLogEntry>;

    /// Up to `limit` entries for (provider, task) created at or after
    /// `since`, newest first
    async fn recent_for(
        &self,
        provider_id: ProviderId,
        task: TaskType,
        since: DateTime<Utc>,
        limit: usize,
    ) -> GatewayResult<Vec<CallLogEntry>>;

    /// Like [`recent_for`](Self::recent_for) but only `ok` and `failed`
    /// entries; circuit-open skips are left out before `limit` applies
    async fn recent_outcomes_for(
        &self,
        provider_id: ProviderId,
        task: TaskType,
        since: DateTime<Utc>,
        limit: usize,
    ) -> GatewayResult<Vec<CallLogEntry>>;

    /// Up to `limit` most recent entries, newest first
    async fn recent(&self, limit: usize) -> GatewayResult<Vec<CallLogEntry>>;
}

/// Append-only trail of administrative changes
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    /// Append one entry
    async fn append_audit(&self, entry: NewAuditEntry) -> GatewayResult<AuditEntry>;

    /// Up to `limit` most recent entries, newest first
    async fn recent_audit(&self, limit: usize) -> GatewayResult<Vec<AuditEntry>>;
}
