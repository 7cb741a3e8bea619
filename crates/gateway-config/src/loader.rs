//! Loading, environment overrides and validation.

use crate::error::{ConfigError, Result};
use crate::settings::GatewayConfig;
use serde::de::value::{Error as ValueError, StrDeserializer};
use serde::de::IntoDeserializer;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "GATEWAY_";

/// Configuration file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.yaml` / `.yml`
    Yaml,
    /// `.toml`
    Toml,
    /// `.json`
    Json,
}

impl ConfigFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => Err(ConfigError::invalid(format!(
                "unsupported config file extension: {}",
                path.display()
            ))),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }
}

impl GatewayConfig {
    /// Deserialize configuration text.
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let parse_err = |message: String| ConfigError::Parse {
            format: format.name(),
            message,
        };
        match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| parse_err(e.to_string())),
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string())),
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string())),
        }
    }

    /// Apply `GATEWAY_*` overrides looked up through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = var("MAX_RETRIES") {
            self.routing.max_retries = parse_number("GATEWAY_MAX_RETRIES", &v)?;
        }
        if let Some(v) = var("RETRY_BACKOFF") {
            self.routing.retry_backoff = parse_duration("GATEWAY_RETRY_BACKOFF", &v)?;
        }
        if let Some(v) = var("CIRCUIT_FAILURE_THRESHOLD") {
            self.routing.circuit_failure_threshold =
                parse_number("GATEWAY_CIRCUIT_FAILURE_THRESHOLD", &v)?;
        }
        if let Some(v) = var("CIRCUIT_WINDOW") {
            self.routing.circuit_window = parse_duration("GATEWAY_CIRCUIT_WINDOW", &v)?;
        }
        if let Some(v) = var("CIRCUIT_SLACK") {
            self.routing.circuit_slack = parse_number("GATEWAY_CIRCUIT_SLACK", &v)?;
        }
        if let Some(v) = var("ATTEMPT_TIMEOUT") {
            self.routing.attempt_timeout = parse_optional_duration("GATEWAY_ATTEMPT_TIMEOUT", &v)?;
        }
        if let Some(v) = var("REQUEST_TIMEOUT") {
            self.routing.request_timeout = parse_optional_duration("GATEWAY_REQUEST_TIMEOUT", &v)?;
        }
        if let Some(v) = var("DATABASE_URL") {
            self.storage.database_url = Some(v).filter(|url| !url.trim().is_empty());
        }
        if let Some(v) = var("LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = var("LOG_FORMAT") {
            self.logging.format = v.parse()?;
        }
        Ok(())
    }

    /// Check ranges and cross-field consistency.
    pub fn validate(&self) -> Result<()> {
        if self.routing.circuit_window.is_zero() && self.routing.circuit_failure_threshold > 0 {
            return Err(ConfigError::invalid(
                "routing.circuit_window must be positive while the circuit breaker is enabled",
            ));
        }
        for (name, timeout) in [
            ("routing.attempt_timeout", self.routing.attempt_timeout),
            ("routing.request_timeout", self.routing.request_timeout),
            ("adapters.chat_timeout", Some(self.adapters.chat_timeout)),
            ("adapters.completion_timeout", Some(self.adapters.completion_timeout)),
            ("adapters.health_timeout", Some(self.adapters.health_timeout)),
        ] {
            if timeout.is_some_and(|t| t.is_zero()) {
                return Err(ConfigError::invalid(format!("{name} must be positive")));
            }
        }
        if self.storage.max_connections == 0 {
            return Err(ConfigError::invalid("storage.max_connections must be at least 1"));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid("logging.level cannot be empty"));
        }

        let mut names = HashSet::new();
        for seed in &self.providers {
            if seed.name.trim().is_empty() {
                return Err(ConfigError::invalid("provider name cannot be empty"));
            }
            if !names.insert(seed.name.trim()) {
                return Err(ConfigError::invalid(format!(
                    "duplicate provider name '{}'",
                    seed.name
                )));
            }
            gateway_core::normalize_base_url(&seed.base_url)
                .map_err(|e| ConfigError::invalid(format!("provider '{}': {e}", seed.name)))?;
        }
        Ok(())
    }
}

/// Load a configuration file, apply process environment overrides and
/// validate the result.
pub async fn load_config(path: impl AsRef<Path>) -> Result<GatewayConfig> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let mut config = GatewayConfig::parse(&content, format)?;
    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;

    info!(
        path = %path.display(),
        providers = config.providers.len(),
        "Loaded gateway configuration"
    );
    Ok(config)
}

/// Defaults plus process environment overrides, validated.
pub fn from_env() -> Result<GatewayConfig> {
    let mut config = GatewayConfig::default();
    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;
    debug!("Using default gateway configuration with environment overrides");
    Ok(config)
}

fn parse_number(name: &str, raw: &str) -> Result<u32> {
    raw.trim()
        .parse()
        .map_err(|e| ConfigError::invalid(format!("{name}: {e}")))
}

fn parse_duration(name: &str, raw: &str) -> Result<Duration> {
    let deserializer: StrDeserializer<'_, ValueError> = raw.trim().into_deserializer();
    humantime_serde::deserialize(deserializer)
        .map_err(|e| ConfigError::invalid(format!("{name}: {e}")))
}

fn parse_optional_duration(name: &str, raw: &str) -> Result<Option<Duration>> {
    match raw.trim() {
        "" | "none" | "off" => Ok(None),
        other => parse_duration(name, other).map(Some),
    }
}
