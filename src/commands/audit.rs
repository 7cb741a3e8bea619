//! Provider administration audit trail.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use gateway_core::{clamp_audit_limit, AuditAction, AuditEntry};
use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use crate::context::GatewayContext;
use crate::output::{self, CommandResult, OutputFormat};

/// Arguments for the audit command.
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Maximum number of entries, newest first (1 to 200)
    #[arg(short, long, default_value_t = 50)]
    pub limit: usize,
}

/// One audit row.
#[derive(Debug, Serialize, Tabled)]
pub struct AuditRow {
    pub id: i64,
    #[tabled(display_with = "output::format_timestamp")]
    pub created_at: DateTime<Utc>,
    #[tabled(display_with = "output::format_optional")]
    pub actor: Option<String>,
    pub action: AuditAction,
    #[tabled(display_with = "format_details")]
    pub details: Value,
}

impl From<AuditEntry> for AuditRow {
    fn from(entry: AuditEntry) -> Self {
        Self {
            id: entry.id,
            created_at: entry.created_at,
            actor: entry.actor,
            action: entry.action,
            details: entry.details,
        }
    }
}

fn format_details(details: &Value) -> String {
    details.to_string()
}

/// Execute the audit command.
pub async fn execute(args: AuditArgs, ctx: &GatewayContext, json: bool) -> Result<()> {
    let format = OutputFormat::from_json_flag(json);
    let limit = clamp_audit_limit(args.limit);

    let rows: Vec<AuditRow> = ctx
        .audit_log()
        .recent_audit(limit)
        .await?
        .into_iter()
        .map(AuditRow::from)
        .collect();

    if json {
        CommandResult::success(rows).print(format)?;
    } else if rows.is_empty() {
        output::warning("No audit entries");
    } else {
        output::section("Provider changes");
        output::table(&rows);
    }
    Ok(())
}
