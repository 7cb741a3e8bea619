//! In-memory stores.
//!
//! Used by tests and by the CLI when no database URL is configured.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gateway_core::{
    AuditEntry, AuditLogStore, CallLogEntry, CallLogStore, CallStatus, GatewayError,
    GatewayResult, NewAuditEntry, NewCallLogEntry, NewProviderConfig, ProviderConfig,
    ProviderConfigUpdate, ProviderId, ProviderStore, TaskType,
};
use parking_lot::RwLock;
use std::cmp::Reverse;

#[derive(Default)]
struct ProviderTable {
    rows: Vec<ProviderConfig>,
    next_id: i64,
}

/// Provider registry held in memory
#[derive(Default)]
pub struct InMemoryProviderStore {
    table: RwLock<ProviderTable>,
}

impl std::fmt::Debug for InMemoryProviderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryProviderStore")
            .field("providers", &self.table.read().rows.len())
            .finish()
    }
}

impl InMemoryProviderStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(mut rows: Vec<ProviderConfig>) -> Vec<ProviderConfig> {
        rows.sort_by_key(|p| (p.priority, p.id));
        rows
    }
}

#[async_trait]
impl ProviderStore for InMemoryProviderStore {
    async fn list_enabled(&self) -> GatewayResult<Vec<ProviderConfig>> {
        let rows = self
            .table
            .read()
            .rows
            .iter()
            .filter(|p| p.enabled)
            .cloned()
            .collect();
        Ok(Self::sorted(rows))
    }

    async fn list_all(&self) -> GatewayResult<Vec<ProviderConfig>> {
        Ok(Self::sorted(self.table.read().rows.clone()))
    }

    async fn get(&self, id: ProviderId) -> GatewayResult<Option<ProviderConfig>> {
        Ok(self.table.read().rows.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, config: NewProviderConfig) -> GatewayResult<ProviderConfig> {
        let config = config.validated()?;
        let mut table = self.table.write();
        if table.rows.iter().any(|p| p.name == config.name) {
            return Err(GatewayError::DuplicateProviderName { name: config.name });
        }

        table.next_id += 1;
        let stored = config.into_config(ProviderId(table.next_id), Utc::now());
        table.rows.push(stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        id: ProviderId,
        update: ProviderConfigUpdate,
    ) -> GatewayResult<ProviderConfig> {
        let mut table = self.table.write();
        let row = table
            .rows
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(GatewayError::ProviderNotFound { id })?;
        update.apply(row)?;
        Ok(row.clone())
    }
}

#[derive(Default)]
struct LogTable {
    rows: Vec<CallLogEntry>,
    next_id: i64,
}

/// Call log held in memory
#[derive(Default)]
pub struct InMemoryCallLog {
    table: RwLock<LogTable>,
}

impl std::fmt::Debug for InMemoryCallLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCallLog")
            .field("entries", &self.len())
            .finish()
    }
}

impl InMemoryCallLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in insertion order
    #[must_use]
    pub fn snapshot(&self) -> Vec<CallLogEntry> {
        self.table.read().rows.clone()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().rows.len()
    }

    /// Whether the log is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn newest_first<'a>(
        rows: impl Iterator<Item = &'a CallLogEntry>,
        limit: usize,
    ) -> Vec<CallLogEntry> {
        let mut selected: Vec<CallLogEntry> = rows.cloned().collect();
        selected.sort_by_key(|e| Reverse((e.created_at, e.id)));
        selected.truncate(limit);
        selected
    }
}

#[async_trait]
impl CallLogStore for InMemoryCallLog {
    async fn append(&self, entry: NewCallLogEntry) -> GatewayResult<CallLogEntry> {
        let mut table = self.table.write();
        table.next_id += 1;
        let stored = entry.into_entry(table.next_id);
        table.rows.push(stored.clone());
        Ok(stored)
    }

    async fn recent_for(
        &self,
        provider_id: ProviderId,
        task: TaskType,
        since: DateTime<Utc>,
        limit: usize,
    ) -> GatewayResult<Vec<CallLogEntry>> {
        let table = self.table.read();
        Ok(Self::newest_first(
            table.rows.iter().filter(|e| {
                e.provider_id == Some(provider_id) && e.task == task && e.created_at >= since
            }),
            limit,
        ))
    }

    async fn recent_outcomes_for(
        &self,
        provider_id: ProviderId,
        task: TaskType,
        since: DateTime<Utc>,
        limit: usize,
    ) -> GatewayResult<Vec<CallLogEntry>> {
        let table = self.table.read();
        Ok(Self::newest_first(
            table.rows.iter().filter(|e| {
                e.provider_id == Some(provider_id)
                    && e.task == task
                    && e.created_at >= since
                    && e.status != CallStatus::SkippedCircuitOpen
            }),
            limit,
        ))
    }

    async fn recent(&self, limit: usize) -> GatewayResult<Vec<CallLogEntry>> {
        let table = self.table.read();
        Ok(Self::newest_first(table.rows.iter(), limit))
    }
}

/// Audit trail held in memory
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    rows: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    /// Create an empty trail
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditLogStore for InMemoryAuditLog {
    async fn append_audit(&self, entry: NewAuditEntry) -> GatewayResult<AuditEntry> {
        let mut rows = self.rows.write();
        let id = rows.last().map_or(1, |last| last.id + 1);
        let stored = entry.into_entry(id);
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn recent_audit(&self, limit: usize) -> GatewayResult<Vec<AuditEntry>> {
        let mut selected = self.rows.read().clone();
        selected.sort_by_key(|e| Reverse((e.created_at, e.id)));
        selected.truncate(limit);
        Ok(selected)
    }
}
