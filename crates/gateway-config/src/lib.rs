//! # Gateway Config
//!
//! Configuration for the meal advisor LLM gateway.
//!
//! Configuration is read from YAML, TOML or JSON (chosen by file
//! extension), then `GATEWAY_*` environment variables override individual
//! settings, then the result is validated. Durations use humantime syntax
//! (`250ms`, `5m`).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod settings;

pub use error::{ConfigError, Result};
pub use loader::{from_env, load_config, ConfigFormat, ENV_PREFIX};
pub use settings::{
    AdapterSettings, GatewayConfig, LogFormat, LoggingSettings, ProviderSeed, RoutingSettings,
    StorageSettings,
};
