//! CLI argument definitions using clap.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use gateway_config::{from_env, load_config, GatewayConfig};
use gateway_telemetry::{init_logging, LoggingConfig};
use std::path::PathBuf;
use tracing::warn;

use crate::commands;
use crate::context::GatewayContext;

/// Meal Advisor Gateway - fallback routing across LLM providers
#[derive(Parser, Debug)]
#[command(name = "meal-gateway")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (YAML, TOML or JSON)
    #[arg(short, long, env = "GATEWAY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database URL; in-memory stores are used when unset
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Name recorded in the audit trail for provider changes
    #[arg(long, env = "GATEWAY_ACTOR", global = true)]
    pub actor: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage provider configurations
    Providers(commands::providers::ProvidersArgs),

    /// Check one provider's endpoint
    Health(commands::health::HealthArgs),

    /// Route a prompt through the fallback chain
    Call(commands::call::CallArgs),

    /// Produce a meal recommendation
    Recommend(commands::recommend::RecommendArgs),

    /// Show recent call log entries
    Logs(commands::logs::LogsArgs),

    /// Show circuit state per provider
    Circuit(commands::circuit::CircuitArgs),

    /// Show recent provider changes
    Audit(commands::audit::AuditArgs),
}

impl Cli {
    /// Load configuration, start logging and run the command.
    ///
    /// `env_file` is a `.env` load failure to report once logging is up.
    pub async fn execute(self, env_file: Option<dotenvy::Error>) -> Result<()> {
        let config = self.load_config().await?;

        let logging = LoggingConfig::from(&config.logging)
            .with_verbosity(self.verbose)
            .with_ansi(!self.json);
        init_logging(&logging).context("failed to initialize logging")?;
        if let Some(err) = env_file {
            warn!(error = %err, "Ignoring unreadable .env file");
        }

        let ctx = GatewayContext::build(&config, self.actor.clone()).await?;
        let result = match self.command {
            Commands::Providers(args) => commands::providers::execute(args, &ctx, &config, self.json).await,
            Commands::Health(args) => commands::health::execute(args, &ctx, self.json).await,
            Commands::Call(args) => commands::call::execute(args, &ctx, self.json).await,
            Commands::Recommend(args) => commands::recommend::execute(args, &ctx, self.json).await,
            Commands::Logs(args) => commands::logs::execute(args, &ctx, self.json).await,
            Commands::Circuit(args) => commands::circuit::execute(args, &ctx, self.json).await,
            Commands::Audit(args) => commands::audit::execute(args, &ctx, self.json).await,
        };

        ctx.close().await;
        result
    }

    async fn load_config(&self) -> Result<GatewayConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)
                .await
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => from_env().context("invalid GATEWAY_* environment")?,
        };
        if let Some(url) = &self.database_url {
            config.storage.database_url = Some(url.clone());
        }
        Ok(config)
    }
}

/// Keep a `.env` load error unless the file simply does not exist
pub fn env_file_error(loaded: dotenvy::Result<PathBuf>) -> Option<dotenvy::Error> {
    loaded.err().filter(|err| !err.not_found())
}
