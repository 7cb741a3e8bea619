//! Configuration sections.

use crate::error::{ConfigError, Result};
use gateway_core::{ModelMap, NewProviderConfig, ProviderKind, DEFAULT_PRIORITY};
use secrecy::SecretString;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Complete gateway configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Fallback chain behaviour.
    pub routing: RoutingSettings,
    /// Per-call HTTP timeouts.
    pub adapters: AdapterSettings,
    /// Registry and call log storage.
    pub storage: StorageSettings,
    /// Log output.
    pub logging: LoggingSettings,
    /// Providers seeded into the registry.
    pub providers: Vec<ProviderSeed>,
}

/// Retry, circuit breaker and cancellation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    /// Attempts per provider.
    pub max_retries: u32,
    /// Linear backoff base.
    #[serde(with = "humantime_serde")]
    pub retry_backoff: Duration,
    /// Consecutive failures that open a circuit; 0 disables it.
    pub circuit_failure_threshold: u32,
    /// Trailing window read by the circuit breaker.
    #[serde(with = "humantime_serde")]
    pub circuit_window: Duration,
    /// Extra log entries read beyond the threshold.
    pub circuit_slack: u32,
    /// Upper bound for one adapter call.
    #[serde(with = "humantime_serde")]
    pub attempt_timeout: Option<Duration>,
    /// Upper bound for a whole fallback chain.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_backoff: Duration::from_secs(1),
            circuit_failure_threshold: 3,
            circuit_window: Duration::from_secs(300),
            circuit_slack: 5,
            attempt_timeout: None,
            request_timeout: None,
        }
    }
}

/// HTTP timeouts used by the provider adapters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AdapterSettings {
    /// OpenAI-compatible text completions.
    #[serde(with = "humantime_serde")]
    pub chat_timeout: Duration,
    /// Every other completion (OpenAI vision, Gemini, Claude).
    #[serde(with = "humantime_serde")]
    pub completion_timeout: Duration,
    /// Health checks.
    #[serde(with = "humantime_serde")]
    pub health_timeout: Duration,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            chat_timeout: Duration::from_secs(25),
            completion_timeout: Duration::from_secs(30),
            health_timeout: Duration::from_secs(10),
        }
    }
}

/// Storage settings. Without a database URL everything lives in memory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// SQLite URL, e.g. `sqlite://gateway.db`.
    pub database_url: Option<String>,
    /// Pool size.
    pub max_connections: u32,
    /// Pool acquire timeout.
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 5,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => f.write_str("pretty"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::invalid(format!("unknown log format '{other}'"))),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive, e.g. `info` or `gateway_routing=debug`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// A provider declared in the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSeed {
    /// Provider family.
    pub provider_type: ProviderKind,
    /// Unique display name.
    pub name: String,
    /// Base URL.
    pub base_url: String,
    /// Inline credential.
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Environment variable holding the credential.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Task → model mapping.
    #[serde(default)]
    pub model_map: ModelMap,
    /// Lower is tried first.
    #[serde(default = "default_priority")]
    pub priority: i32,
    /// Routing flag.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

fn default_enabled() -> bool {
    true
}

impl ProviderSeed {
    /// Resolve the credential: inline value first, then `api_key_env`.
    pub fn resolve_api_key<F>(&self, lookup: F) -> Result<SecretString>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = &self.api_key {
            return Ok(key.clone());
        }
        match &self.api_key_env {
            Some(var) => lookup(var).map(SecretString::new).ok_or_else(|| {
                ConfigError::invalid(format!(
                    "provider '{}': environment variable {var} is not set",
                    self.name
                ))
            }),
            None => Err(ConfigError::invalid(format!(
                "provider '{}' needs api_key or api_key_env",
                self.name
            ))),
        }
    }

    /// Build a create payload for the registry.
    pub fn to_new_provider<F>(&self, lookup: F) -> Result<NewProviderConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config =
            NewProviderConfig::new(self.provider_type, &self.name, &self.base_url, String::new())
                .with_model_map(self.model_map.clone())
                .with_priority(self.priority)
                .with_enabled(self.enabled);
        config.api_key = self.resolve_api_key(lookup)?;
        Ok(config)
    }
}
