//! SQLite-backed provider registry, call log and audit trail.

use crate::error::{Result, StoreError};
use crate::pool::PoolConfig;
use crate::schema::{self, CREATE_SCHEMA_MIGRATIONS};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gateway_core::{
    AuditAction, AuditEntry, AuditLogStore, CallLogEntry, CallLogStore, CallStatus,
    GatewayResult, ModelMap, NewAuditEntry, NewCallLogEntry, NewProviderConfig, ProviderConfig,
    ProviderConfigUpdate, ProviderId, ProviderKind, ProviderStore, TaskType,
};
use secrecy::{ExposeSecret, SecretString};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::{Row, SqliteConnection};
use std::str::FromStr;
use tracing::{debug, info};

const PROVIDER_COLUMNS: &str =
    "id, provider_type, name, base_url, api_key, model_map, priority, enabled, created_at";

const CALL_LOG_COLUMNS: &str =
    "id, provider_id, task_type, attempt, latency_ms, status, error_message, created_at";

const AUDIT_COLUMNS: &str = "id, actor, action, details, created_at";

/// Provider registry, call log and audit trail in one SQLite database
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to `url` (e.g. `sqlite://gateway.db`), creating the file if
    /// missing.
    ///
    /// # Errors
    /// Returns a connection error if the URL is invalid or unreachable
    pub async fn connect(url: &str, config: &PoolConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::connection(e.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = config
            .pool_options()
            .connect_with(options)
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        info!(url = %url, max_connections = config.max_connections, "Connected to SQLite store");
        Ok(Self { pool })
    }

    /// Fresh migrated in-memory database
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated
    pub async fn in_memory() -> Result<Self> {
        let store = Self::connect("sqlite::memory:", &PoolConfig::in_memory()).await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Wrap an existing pool
    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Apply every schema step not yet recorded.
    ///
    /// # Errors
    /// Returns an execution error if a statement fails
    pub async fn migrate(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(CREATE_SCHEMA_MIGRATIONS).execute(&mut *tx).await?;

        for step in schema::all_steps() {
            let applied: Option<i64> =
                sqlx::query_scalar("SELECT version FROM schema_migrations WHERE version = ?")
                    .bind(step.version)
                    .fetch_optional(&mut *tx)
                    .await?;
            if applied.is_some() {
                continue;
            }

            for statement in &step.statements {
                sqlx::query(statement).execute(&mut *tx).await?;
            }
            sqlx::query("INSERT INTO schema_migrations (version, name, applied_at) VALUES (?, ?, ?)")
                .bind(step.version)
                .bind(step.name)
                .bind(Utc::now().timestamp_millis())
                .execute(&mut *tx)
                .await?;
            info!(version = step.version, name = step.name, "Applied schema step");
        }

        tx.commit().await?;
        Ok(())
    }

    async fn fetch_provider(
        conn: &mut SqliteConnection,
        id: ProviderId,
    ) -> Result<Option<ProviderConfig>> {
        let sql = format!("SELECT {PROVIDER_COLUMNS} FROM providers WHERE id = ?");
        sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(conn)
            .await?
            .as_ref()
            .map(provider_from_row)
            .transpose()
    }

    async fn list_providers(&self, enabled_only: bool) -> Result<Vec<ProviderConfig>> {
        let filter = if enabled_only { "WHERE enabled = 1" } else { "" };
        let sql =
            format!("SELECT {PROVIDER_COLUMNS} FROM providers {filter} ORDER BY priority, id");
        sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(provider_from_row)
            .collect()
    }

    async fn insert_provider(&self, config: NewProviderConfig) -> Result<ProviderConfig> {
        let config = config.validated().map_err(StoreError::Invalid)?;
        let created_at = now_millis();
        let model_map = serde_json::to_string(&config.model_map)?;

        let inserted = sqlx::query(
            "INSERT INTO providers \
             (provider_type, name, base_url, api_key, model_map, priority, enabled, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(config.kind.as_str())
        .bind(&config.name)
        .bind(&config.base_url)
        .bind(config.api_key.expose_secret().as_str())
        .bind(model_map)
        .bind(config.priority)
        .bind(config.enabled)
        .bind(created_at.timestamp_millis())
        .execute(&self.pool)
        .await;

        let id = match inserted {
            Ok(done) => done.last_insert_rowid(),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(StoreError::DuplicateName { name: config.name });
            }
            Err(e) => return Err(e.into()),
        };

        debug!(provider_id = id, name = %config.name, "Created provider");
        Ok(config.into_config(ProviderId(id), created_at))
    }

    async fn update_provider(
        &self,
        id: ProviderId,
        update: ProviderConfigUpdate,
    ) -> Result<ProviderConfig> {
        let mut tx = self.pool.begin().await?;
        let mut config = Self::fetch_provider(&mut tx, id)
            .await?
            .ok_or(StoreError::NotFound { id })?;
        update.apply(&mut config).map_err(StoreError::Invalid)?;

        sqlx::query(
            "UPDATE providers SET base_url = ?, api_key = ?, model_map = ?, priority = ?, enabled = ? \
             WHERE id = ?",
        )
        .bind(&config.base_url)
        .bind(config.api_key.expose_secret().as_str())
        .bind(serde_json::to_string(&config.model_map)?)
        .bind(config.priority)
        .bind(config.enabled)
        .bind(id.get())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        debug!(provider_id = %id, "Updated provider");
        Ok(config)
    }

    async fn insert_log(&self, entry: NewCallLogEntry) -> Result<CallLogEntry> {
        let created_at = truncate_millis(entry.created_at);
        let done = sqlx::query(
            "INSERT INTO call_logs \
             (provider_id, task_type, attempt, latency_ms, status, error_message, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.provider_id.map(ProviderId::get))
        .bind(entry.task.as_str())
        .bind(i64::from(entry.attempt))
        .bind(entry.latency_ms as i64)
        .bind(entry.status.as_str())
        .bind(entry.error_message.as_deref())
        .bind(created_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(entry.at(created_at).into_entry(done.last_insert_rowid()))
    }

    async fn select_logs(
        &self,
        filter: Option<LogFilter>,
        limit: usize,
    ) -> Result<Vec<CallLogEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = match filter {
            Some(filter) => {
                let skips = if filter.outcomes_only {
                    "AND status != 'skipped_circuit_open'"
                } else {
                    ""
                };
                let sql = format!(
                    "SELECT {CALL_LOG_COLUMNS} FROM call_logs \
                     WHERE provider_id = ? AND task_type = ? AND created_at >= ? {skips} \
                     ORDER BY created_at DESC, id DESC LIMIT ?"
                );
                sqlx::query(&sql)
                    .bind(filter.provider_id.get())
                    .bind(filter.task.as_str())
                    .bind(filter.since.timestamp_millis())
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {CALL_LOG_COLUMNS} FROM call_logs \
                     ORDER BY created_at DESC, id DESC LIMIT ?"
                );
                sqlx::query(&sql).bind(limit).fetch_all(&self.pool).await?
            }
        };
        rows.iter().map(call_log_from_row).collect()
    }

    async fn insert_audit(&self, entry: NewAuditEntry) -> Result<AuditEntry> {
        let created_at = truncate_millis(entry.created_at);
        let details = serde_json::to_string(&entry.details)?;
        let done = sqlx::query(
            "INSERT INTO audit_logs (actor, action, details, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(entry.actor.as_deref())
        .bind(entry.action.as_str())
        .bind(details)
        .bind(created_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        debug!(action = %entry.action, "Recorded audit entry");
        Ok(entry.at(created_at).into_entry(done.last_insert_rowid()))
    }

    async fn select_audit(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let sql = format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_logs ORDER BY created_at DESC, id DESC LIMIT ?"
        );
        let rows = sqlx::query(&sql).bind(limit).fetch_all(&self.pool).await?;
        rows.iter().map(audit_from_row).collect()
    }
}

/// Narrowing of a call log read to one (provider, task) window
#[derive(Debug, Clone, Copy)]
struct LogFilter {
    provider_id: ProviderId,
    task: TaskType,
    since: DateTime<Utc>,
    outcomes_only: bool,
}

fn now_millis() -> DateTime<Utc> {
    truncate_millis(Utc::now())
}

fn truncate_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ts.timestamp_millis()).unwrap_or(ts)
}

fn millis_to_datetime(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::corrupt(format!("timestamp out of range: {ms}")))
}

fn provider_from_row(row: &SqliteRow) -> Result<ProviderConfig> {
    let kind: String = row.try_get("provider_type")?;
    let kind = kind
        .parse::<ProviderKind>()
        .map_err(|e| StoreError::corrupt(e.to_string()))?;
    let model_map: String = row.try_get("model_map")?;
    let model_map: ModelMap = serde_json::from_str(&model_map)?;
    let api_key: String = row.try_get("api_key")?;

    Ok(ProviderConfig {
        id: ProviderId(row.try_get("id")?),
        kind,
        name: row.try_get("name")?,
        base_url: row.try_get("base_url")?,
        api_key: SecretString::new(api_key),
        model_map,
        priority: row.try_get("priority")?,
        enabled: row.try_get("enabled")?,
        created_at: millis_to_datetime(row.try_get("created_at")?)?,
    })
}

fn call_log_from_row(row: &SqliteRow) -> Result<CallLogEntry> {
    let task: String = row.try_get("task_type")?;
    let status: String = row.try_get("status")?;
    let attempt: i64 = row.try_get("attempt")?;
    let latency_ms: i64 = row.try_get("latency_ms")?;

    Ok(CallLogEntry {
        id: row.try_get("id")?,
        provider_id: row.try_get::<Option<i64>, _>("provider_id")?.map(ProviderId),
        task: task
            .parse::<TaskType>()
            .map_err(|e| StoreError::corrupt(e.to_string()))?,
        attempt: u32::try_from(attempt)
            .map_err(|_| StoreError::corrupt(format!("attempt out of range: {attempt}")))?,
        latency_ms: u64::try_from(latency_ms)
            .map_err(|_| StoreError::corrupt(format!("latency out of range: {latency_ms}")))?,
        status: status
            .parse::<CallStatus>()
            .map_err(|e| StoreError::corrupt(e.to_string()))?,
        error_message: row.try_get("error_message")?,
        created_at: millis_to_datetime(row.try_get("created_at")?)?,
    })
}

fn audit_from_row(row: &SqliteRow) -> Result<AuditEntry> {
    let action: String = row.try_get("action")?;
    let details: String = row.try_get("details")?;

    Ok(AuditEntry {
        id: row.try_get("id")?,
        actor: row.try_get("actor")?,
        action: action
            .parse::<AuditAction>()
            .map_err(|e| StoreError::corrupt(e.to_string()))?,
        details: serde_json::from_str(&details)?,
        created_at: millis_to_datetime(row.try_get("created_at")?)?,
    })
}

#[async_trait]
impl ProviderStore for SqliteStore {
    async fn list_enabled(&self) -> GatewayResult<Vec<ProviderConfig>> {
        Ok(self.list_providers(true).await?)
    }

    async fn list_all(&self) -> GatewayResult<Vec<ProviderConfig>> {
        Ok(self.list_providers(false).await?)
    }

    async fn get(&self, id: ProviderId) -> GatewayResult<Option<ProviderConfig>> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::from)?;
        Ok(Self::fetch_provider(&mut conn, id).await?)
    }

    async fn create(&self, config: NewProviderConfig) -> GatewayResult<ProviderConfig> {
        Ok(self.insert_provider(config).await?)
    }

    async fn update(
        &self,
        id: ProviderId,
        update: ProviderConfigUpdate,
    ) -> GatewayResult<ProviderConfig> {
        Ok(self.update_provider(id, update).await?)
    }
}

#[async_trait]
impl CallLogStore for SqliteStore {
    async fn append(&self, entry: NewCallLogEntry) -> GatewayResult<CallLogEntry> {
        Ok(self.insert_log(entry).await?)
    }

    async fn recent_for(
        &self,
        provider_id: ProviderId,
        task: TaskType,
        since: DateTime<Utc>,
        limit: usize,
    ) -> GatewayResult<Vec<CallLogEntry>> {
        let filter = LogFilter {
            provider_id,
            task,
            since,
            outcomes_only: false,
        };
        Ok(self.select_logs(Some(filter), limit).await?)
    }

    async fn recent_outcomes_for(
        &self,
        provider_id: ProviderId,
        task: TaskType,
        since: DateTime<Utc>,
        limit: usize,
    ) -> GatewayResult<Vec<CallLogEntry>> {
        let filter = LogFilter {
            provider_id,
            task,
            since,
            outcomes_only: true,
        };
        Ok(self.select_logs(Some(filter), limit).await?)
    }

    async fn recent(&self, limit: usize) -> GatewayResult<Vec<CallLogEntry>> {
        Ok(self.select_logs(None, limit).await?)
    }
}

#[async_trait]
impl AuditLogStore for SqliteStore {
    async fn append_audit(&self, entry: NewAuditEntry) -> GatewayResult<AuditEntry> {
        Ok(self.insert_audit(entry).await?)
    }

    async fn recent_audit(&self, limit: usize) -> GatewayResult<Vec<AuditEntry>> {
        Ok(self.select_audit(limit).await?)
    }
}
