//! Provider health check command.

use anyhow::{anyhow, Result};
use clap::Args;
use gateway_core::{HealthCheckReport, ProviderId};

use crate::context::GatewayContext;
use crate::output::{self, CommandResult, OutputFormat};

/// Arguments for the health command.
#[derive(Args, Debug)]
pub struct HealthArgs {
    /// Provider id
    pub id: i64,
}

/// Execute the health command.
///
/// Checks the provider directly, outside the fallback chain; the call log
/// and circuit are not touched.
pub async fn execute(args: HealthArgs, ctx: &GatewayContext, json: bool) -> Result<()> {
    let format = OutputFormat::from_json_flag(json);
    let id = ProviderId(args.id);

    let provider = ctx
        .router()
        .registry()
        .get(id)
        .await?
        .ok_or_else(|| anyhow!("provider {id} not found"))?;

    let report = ctx.router().health_check(&provider).await;

    if json {
        let result = if report.ok {
            CommandResult::success(report)
        } else {
            let detail = report.detail.clone();
            CommandResult::failure_with(report, detail)
        };
        result.print(format)?;
    } else {
        display_report(&provider.name, &report);
    }

    Ok(())
}

fn display_report(name: &str, report: &HealthCheckReport) {
    output::section(&format!("Provider {} ({name})", report.provider_id));
    output::status(if report.ok { "reachable" } else { "unreachable" }, report.ok);
    output::key_value("Latency", &output::format_latency(&report.latency_ms));
    output::key_value("Detail", &report.detail);
}
