//! Call log inspection command.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use gateway_core::{CallLogEntry, ProviderId, TaskType};
use serde::Serialize;
use tabled::Tabled;

use crate::context::GatewayContext;
use crate::output::{self, CommandResult, OutputFormat};

/// Arguments for the logs command.
#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Maximum number of entries, newest first
    #[arg(short, long, default_value_t = 50)]
    pub limit: usize,

    /// Only entries of this provider
    #[arg(short, long, requires = "task")]
    pub provider: Option<i64>,

    /// Only entries of this task (with --provider)
    #[arg(short, long)]
    pub task: Option<TaskType>,

    /// How far back to look with --provider, in minutes
    #[arg(long, default_value_t = 1440)]
    pub window_minutes: i64,
}

/// One log row.
#[derive(Debug, Serialize, Tabled)]
pub struct LogRow {
    pub id: i64,
    #[tabled(display_with = "output::format_timestamp")]
    pub created_at: DateTime<Utc>,
    #[tabled(display_with = "output::format_optional")]
    pub provider_id: Option<ProviderId>,
    pub task: TaskType,
    pub attempt: u32,
    pub status: String,
    #[tabled(display_with = "output::format_latency")]
    pub latency_ms: u64,
    #[tabled(display_with = "output::format_optional")]
    pub error: Option<String>,
}

impl From<CallLogEntry> for LogRow {
    fn from(entry: CallLogEntry) -> Self {
        Self {
            id: entry.id,
            created_at: entry.created_at,
            provider_id: entry.provider_id,
            task: entry.task,
            attempt: entry.attempt,
            status: entry.status.to_string(),
            latency_ms: entry.latency_ms,
            error: entry.error_message,
        }
    }
}

/// Execute the logs command.
pub async fn execute(args: LogsArgs, ctx: &GatewayContext, json: bool) -> Result<()> {
    let format = OutputFormat::from_json_flag(json);
    let log = ctx.router().call_log();

    let entries = match (args.provider, args.task) {
        (Some(provider), Some(task)) => {
            let since = Utc::now() - Duration::minutes(args.window_minutes);
            log.recent_for(ProviderId(provider), task, since, args.limit)
                .await?
        }
        _ => log.recent(args.limit).await?,
    };
    let rows: Vec<LogRow> = entries.into_iter().map(LogRow::from).collect();

    if json {
        CommandResult::success(rows).print(format)?;
    } else {
        output::section("Recent calls");
        output::table(&rows);
    }
    Ok(())
}
