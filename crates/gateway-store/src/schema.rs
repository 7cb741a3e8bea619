//! Database schema.
//!
//! Every step is idempotent; applied versions are recorded in
//! `schema_migrations`.

/// One versioned schema step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaStep {
    /// Monotonic version number.
    pub version: i64,
    /// Short name.
    pub name: &'static str,
    /// Statements executed in order.
    pub statements: Vec<&'static str>,
}

/// Bookkeeping table for applied steps.
pub const CREATE_SCHEMA_MIGRATIONS: &str = r"
    CREATE TABLE IF NOT EXISTS schema_migrations (
        version INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        applied_at INTEGER NOT NULL
    )";

/// Get all steps in order.
#[must_use]
pub fn all_steps() -> Vec<SchemaStep> {
    vec![
        v001_create_providers(),
        v002_create_call_logs(),
        v003_create_audit_logs(),
    ]
}

/// V001: Create providers table.
#[must_use]
pub fn v001_create_providers() -> SchemaStep {
    SchemaStep {
        version: 1,
        name: "create_providers",
        statements: vec![
            r"
            CREATE TABLE IF NOT EXISTS providers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                provider_type TEXT NOT NULL,
                name TEXT NOT NULL UNIQUE,
                base_url TEXT NOT NULL,
                api_key TEXT NOT NULL,
                model_map TEXT NOT NULL DEFAULT '{}',
                priority INTEGER NOT NULL DEFAULT 100,
                enabled INTEGER NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_providers_enabled_priority ON providers(enabled, priority, id)",
        ],
    }
}

/// V002: Create call log table.
#[must_use]
pub fn v002_create_call_logs() -> SchemaStep {
    SchemaStep {
        version: 2,
        name: "create_call_logs",
        statements: vec![
            r"
            CREATE TABLE IF NOT EXISTS call_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                provider_id INTEGER REFERENCES providers(id),
                task_type TEXT NOT NULL,
                attempt INTEGER NOT NULL,
                latency_ms INTEGER NOT NULL,
                status TEXT NOT NULL,
                error_message TEXT,
                created_at INTEGER NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_call_logs_provider_task_created ON call_logs(provider_id, task_type, created_at)",
            "CREATE INDEX IF NOT EXISTS idx_call_logs_created ON call_logs(created_at)",
        ],
    }
}

/// V003: Create audit trail table.
#[must_use]
pub fn v003_create_audit_logs() -> SchemaStep {
    SchemaStep {
        version: 3,
        name: "create_audit_logs",
        statements: vec![
            r"
            CREATE TABLE IF NOT EXISTS audit_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                actor TEXT,
                action TEXT NOT NULL,
                details TEXT NOT NULL DEFAULT '{}',
                created_at INTEGER NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_audit_logs_created ON audit_logs(created_at)",
        ],
    }
}
