//! Append-only record of administrative changes to the provider table.

use crate::error::GatewayError;
use crate::provider::{ProviderConfig, ProviderConfigUpdate};
use crate::types::ProviderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Upper bound for one audit listing
pub const AUDIT_LIST_MAX: usize = 200;

/// Clamp a requested listing size to `1..=AUDIT_LIST_MAX`
#[must_use]
pub fn clamp_audit_limit(limit: usize) -> usize {
    limit.clamp(1, AUDIT_LIST_MAX)
}

/// Kind of administrative change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A provider was registered
    CreateProvider,
    /// A provider was modified
    UpdateProvider,
}

impl AuditAction {
    /// Stored action string
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateProvider => "create_provider",
            Self::UpdateProvider => "update_provider",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create_provider" => Ok(Self::CreateProvider),
            "update_provider" => Ok(Self::UpdateProvider),
            other => Err(GatewayError::storage(format!("unknown audit action '{other}'"))),
        }
    }
}

/// A stored audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Row identifier, increasing in insertion order
    pub id: i64,
    /// Who made the change, when known
    pub actor: Option<String>,
    /// What changed
    pub action: AuditAction,
    /// Action-specific details; never holds credentials
    pub details: Value,
    /// When the change was recorded
    pub created_at: DateTime<Utc>,
}

/// An audit record before it is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    /// Who made the change, when known
    pub actor: Option<String>,
    /// What changed
    pub action: AuditAction,
    /// Action-specific details
    pub details: Value,
    /// Timestamp to record
    pub created_at: DateTime<Utc>,
}

impl NewAuditEntry {
    /// Record a provider registration
    #[must_use]
    pub fn provider_created(actor: Option<String>, provider: &ProviderConfig) -> Self {
        Self {
            actor,
            action: AuditAction::CreateProvider,
            details: json!({ "provider_id": provider.id, "name": provider.name }),
            created_at: Utc::now(),
        }
    }

    /// Record a provider update, naming the fields it touched
    #[must_use]
    pub fn provider_updated(
        actor: Option<String>,
        id: ProviderId,
        update: &ProviderConfigUpdate,
    ) -> Self {
        let fields: Vec<&str> = [
            ("base_url", update.base_url.is_some()),
            ("api_key", update.api_key.is_some()),
            ("model_map", update.model_map.is_some()),
            ("priority", update.priority.is_some()),
            ("enabled", update.enabled.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, touched)| touched.then_some(name))
        .collect();

        Self {
            actor,
            action: AuditAction::UpdateProvider,
            details: json!({ "provider_id": id, "fields": fields }),
            created_at: Utc::now(),
        }
    }

    /// Override the timestamp
    #[must_use]
    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Materialise a stored entry
    #[must_use]
    pub fn into_entry(self, id: i64) -> AuditEntry {
        AuditEntry {
            id,
            actor: self.actor,
            action: self.action,
            details: self.details,
            created_at: self.created_at,
        }
    }
}
