//! Route one prompt through the fallback chain.

use anyhow::Result;
use clap::Args;
use gateway_core::TaskType;
use gateway_telemetry::TelemetryError;

use crate::context::GatewayContext;
use crate::output::{self, CommandResult, OutputFormat};

/// Arguments for the call command.
#[derive(Args, Debug)]
pub struct CallArgs {
    /// Task bucket: default, emotion, vision or recommend
    #[arg(short, long, default_value = "default")]
    pub task: TaskType,

    /// Prompt text
    #[arg(short, long)]
    pub prompt: String,

    /// Image URL for vision-capable providers (repeatable)
    #[arg(short, long = "image")]
    pub images: Vec<String>,

    /// Print the Prometheus exposition after the call
    #[arg(long)]
    pub metrics: bool,
}

/// Execute the call command.
pub async fn execute(args: CallArgs, ctx: &GatewayContext, json: bool) -> Result<()> {
    let format = OutputFormat::from_json_flag(json);
    let response = ctx
        .router()
        .call_with_fallback(args.task, &args.prompt, &args.images)
        .await?;

    if json {
        let result = match response.error.clone() {
            Some(error) if !response.ok => CommandResult::failure_with(response, error),
            _ => CommandResult::success(response),
        };
        result.print(format)?;
    } else if response.ok {
        output::section(&format!("Answer ({} task)", args.task));
        println!("{}", response.content);
        output::key_value("Provider", &output::format_optional(&response.provider_id));
        output::key_value("Attempt", &output::format_optional(&response.attempt));
    } else {
        output::error(response.error.as_deref().unwrap_or("call failed"));
    }

    if args.metrics {
        let rendered = ctx
            .router()
            .metrics()
            .map(gateway_telemetry::GatewayMetrics::render)
            .transpose()?
            .ok_or_else(|| TelemetryError::Metrics("metrics are not enabled".to_string()))?;
        // Metrics go to stderr so --json stdout stays one document
        eprintln!("{rendered}");
    }

    Ok(())
}
