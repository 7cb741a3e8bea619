//! Provider management commands.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use gateway_config::GatewayConfig;
use gateway_core::{
    GatewayError, ModelMap, NewProviderConfig, ProviderConfig, ProviderConfigUpdate, ProviderId,
    ProviderKind, TaskType, DEFAULT_PRIORITY,
};
use secrecy::SecretString;
use serde::Serialize;
use tabled::Tabled;

use crate::context::GatewayContext;
use crate::output::{self, CommandResult, OutputFormat};

/// Arguments for the providers command.
#[derive(Args, Debug)]
pub struct ProvidersArgs {
    #[command(subcommand)]
    pub action: ProvidersAction,
}

#[derive(Subcommand, Debug)]
pub enum ProvidersAction {
    /// List providers in routing order
    List {
        /// Include disabled providers
        #[arg(long)]
        all: bool,
    },

    /// Register a provider
    Add(AddArgs),

    /// Change fields of an existing provider
    Update(UpdateArgs),

    /// Create the providers listed in the configuration file
    Seed,
}

/// Arguments for `providers add`.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Provider family: openai_compatible, new_api, gemini or claude
    #[arg(short, long)]
    pub kind: ProviderKind,

    /// Unique display name
    #[arg(short, long)]
    pub name: String,

    /// API base URL
    #[arg(short, long)]
    pub base_url: String,

    /// Credential
    #[arg(long, env = "GATEWAY_PROVIDER_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Model per task, e.g. `--model default=gpt-4o-mini` (repeatable)
    #[arg(short, long = "model", value_parser = parse_model_entry)]
    pub models: Vec<(TaskType, String)>,

    /// Lower is tried first
    #[arg(short, long, default_value_t = DEFAULT_PRIORITY)]
    pub priority: i32,

    /// Register without routing to it
    #[arg(long)]
    pub disabled: bool,
}

/// Arguments for `providers update`.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Provider id
    pub id: i64,

    /// New API base URL
    #[arg(short, long)]
    pub base_url: Option<String>,

    /// New credential
    #[arg(long, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Replace the model map (repeatable `task=model`)
    #[arg(short, long = "model", value_parser = parse_model_entry)]
    pub models: Vec<(TaskType, String)>,

    /// New priority
    #[arg(short, long)]
    pub priority: Option<i32>,

    /// Route to this provider again
    #[arg(long, conflicts_with = "disable")]
    pub enable: bool,

    /// Stop routing to this provider
    #[arg(long)]
    pub disable: bool,
}

impl UpdateArgs {
    fn into_update(self) -> ProviderConfigUpdate {
        let enabled = match (self.enable, self.disable) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        ProviderConfigUpdate {
            base_url: self.base_url,
            api_key: self.api_key.map(SecretString::new),
            model_map: (!self.models.is_empty())
                .then(|| self.models.into_iter().collect::<ModelMap>()),
            priority: self.priority,
            enabled,
        }
    }
}

/// Parse one `task=model` pair.
fn parse_model_entry(raw: &str) -> Result<(TaskType, String), String> {
    let (task, model) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected task=model, got '{raw}'"))?;
    let task = task.trim().parse::<TaskType>().map_err(|e| e.to_string())?;
    let model = model.trim();
    if model.is_empty() {
        return Err(format!("empty model name for task '{task}'"));
    }
    Ok((task, model.to_string()))
}

/// Provider as shown to operators; the credential is never printed.
#[derive(Debug, Serialize, Tabled)]
pub struct ProviderView {
    pub id: ProviderId,
    pub name: String,
    pub kind: ProviderKind,
    pub base_url: String,
    pub priority: i32,
    pub enabled: bool,
    #[tabled(display_with = "format_models")]
    pub models: Vec<String>,
    #[tabled(display_with = "output::format_timestamp")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&ProviderConfig> for ProviderView {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            id: config.id,
            name: config.name.clone(),
            kind: config.kind,
            base_url: config.base_url.clone(),
            priority: config.priority,
            enabled: config.enabled,
            models: config
                .model_map
                .iter()
                .map(|(task, model)| format!("{task}={model}"))
                .collect(),
            created_at: config.created_at,
        }
    }
}

fn format_models(models: &[String]) -> String {
    if models.is_empty() {
        "-".to_string()
    } else {
        models.join(", ")
    }
}

/// Result of seeding from configuration.
#[derive(Debug, Default, Serialize)]
pub struct SeedOutput {
    pub created: Vec<ProviderView>,
    pub skipped: Vec<String>,
}

/// Execute the providers command.
pub async fn execute(
    args: ProvidersArgs,
    ctx: &GatewayContext,
    config: &GatewayConfig,
    json: bool,
) -> Result<()> {
    let format = OutputFormat::from_json_flag(json);
    let registry = ctx.router().registry();

    match args.action {
        ProvidersAction::List { all } => {
            let providers = if all {
                registry.list_all().await?
            } else {
                registry.list_enabled().await?
            };
            let views: Vec<ProviderView> = providers.iter().map(ProviderView::from).collect();
            if json {
                CommandResult::success(views).print(format)?;
            } else {
                output::section("Providers");
                output::table(&views);
            }
        }
        ProvidersAction::Add(args) => {
            let new = NewProviderConfig::new(args.kind, args.name, args.base_url, args.api_key)
                .with_model_map(args.models.into_iter().collect())
                .with_priority(args.priority)
                .with_enabled(!args.disabled);
            let created = registry.create(new).await?;
            CommandResult::success(ProviderView::from(&created))
                .with_message(format!("Created provider {} ({})", created.name, created.id))
                .print(format)?;
        }
        ProvidersAction::Update(args) => {
            let id = ProviderId(args.id);
            let update = args.into_update();
            if update.is_empty() {
                bail!("nothing to update for provider {id}");
            }
            let updated = registry.update(id, update).await?;
            CommandResult::success(ProviderView::from(&updated))
                .with_message(format!("Updated provider {} ({})", updated.name, updated.id))
                .print(format)?;
        }
        ProvidersAction::Seed => {
            let seeded = seed(ctx, config).await?;
            let message = format!(
                "Seeded {} provider(s), skipped {}",
                seeded.created.len(),
                seeded.skipped.len()
            );
            if json {
                CommandResult::success(seeded).with_message(message).print(format)?;
            } else {
                for name in &seeded.skipped {
                    output::warning(&format!("{name} already exists, skipped"));
                }
                output::table(&seeded.created);
                output::success(&message);
            }
        }
    }

    Ok(())
}

/// Create every configured provider whose name is not taken yet.
async fn seed(ctx: &GatewayContext, config: &GatewayConfig) -> Result<SeedOutput> {
    let registry = ctx.router().registry();
    let mut out = SeedOutput::default();

    for provider in &config.providers {
        let new = provider.to_new_provider(|key| std::env::var(key).ok())?;
        match registry.create(new).await {
            Ok(created) => out.created.push(ProviderView::from(&created)),
            Err(GatewayError::DuplicateProviderName { name }) => out.skipped.push(name),
            Err(err) => return Err(err.into()),
        }
    }
    Ok(out)
}
