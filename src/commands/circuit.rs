//! Circuit overview command.

use anyhow::Result;
use clap::Args;
use gateway_core::{ProviderId, TaskType};
use gateway_routing::ProviderCircuit;
use serde::Serialize;
use tabled::Tabled;

use crate::context::GatewayContext;
use crate::output::{self, CommandResult, OutputFormat};

/// Arguments for the circuit command.
#[derive(Args, Debug)]
pub struct CircuitArgs {
    /// Task whose circuits to show
    #[arg(short, long, default_value = "default")]
    pub task: TaskType,
}

#[derive(Debug, Serialize, Tabled)]
struct CircuitRow {
    provider_id: ProviderId,
    name: String,
    priority: i32,
    state: String,
    consecutive_failures: u32,
    sampled: usize,
}

impl From<&ProviderCircuit> for CircuitRow {
    fn from(circuit: &ProviderCircuit) -> Self {
        Self {
            provider_id: circuit.provider_id,
            name: circuit.name.clone(),
            priority: circuit.priority,
            state: circuit.evaluation.state.to_string(),
            consecutive_failures: circuit.evaluation.consecutive_failures,
            sampled: circuit.evaluation.sampled,
        }
    }
}

/// Execute the circuit command.
pub async fn execute(args: CircuitArgs, ctx: &GatewayContext, json: bool) -> Result<()> {
    let format = OutputFormat::from_json_flag(json);
    let circuits = ctx.router().circuit_overview(args.task).await?;

    if json {
        CommandResult::success(circuits).print(format)?;
        return Ok(());
    }

    let threshold = ctx.router().config().circuit.failure_threshold;
    output::section(&format!("Circuits for {} task", args.task));
    if threshold == 0 {
        output::warning("circuit breaker disabled (failure threshold 0)");
    }
    let rows: Vec<CircuitRow> = circuits.iter().map(CircuitRow::from).collect();
    output::table(&rows);
    Ok(())
}
