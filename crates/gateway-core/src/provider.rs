//! Provider configuration and the provider adapter contract.

use crate::error::{GatewayError, GatewayResult};
use crate::request::ProviderRequest;
use crate::response::ProviderResult;
use crate::types::{ProviderId, TaskType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Model name used when a provider's model map has neither a task entry
/// nor a `default` entry.
pub const FALLBACK_MODEL: &str = "default-model";

/// Default priority for newly created providers
pub const DEFAULT_PRIORITY: i32 = 100;

/// Provider family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Any OpenAI chat-completions compatible endpoint
    OpenaiCompatible,
    /// "new-api" style relay, wire-compatible with OpenAI
    NewApi,
    /// Google Gemini (generateContent)
    Gemini,
    /// Anthropic Claude (messages)
    Claude,
}

impl ProviderKind {
    /// Every supported family
    pub const ALL: [Self; 4] = [Self::OpenaiCompatible, Self::NewApi, Self::Gemini, Self::Claude];

    /// Family string as stored in configuration
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenaiCompatible => "openai_compatible",
            Self::NewApi => "new_api",
            Self::Gemini => "gemini",
            Self::Claude => "claude",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| GatewayError::unsupported_provider_type(s))
    }
}

/// Task → model mapping of one provider.
///
/// Keys are restricted to [`TaskType`], so a map can never name a task
/// outside the vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelMap(BTreeMap<TaskType, String>);

impl ModelMap {
    /// Create an empty map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a task entry
    #[must_use]
    pub fn with(mut self, task: TaskType, model: impl Into<String>) -> Self {
        self.0.insert(task, model.into());
        self
    }

    /// Task entry, then `default`, then [`FALLBACK_MODEL`].
    ///
    /// Blank entries are treated as absent.
    #[must_use]
    pub fn resolve(&self, task: TaskType) -> &str {
        self.entry(task)
            .or_else(|| self.entry(TaskType::Default))
            .unwrap_or(FALLBACK_MODEL)
    }

    fn entry(&self, task: TaskType) -> Option<&str> {
        self.0
            .get(&task)
            .map(String::as_str)
            .filter(|m| !m.trim().is_empty())
    }

    /// Iterate entries in task order
    pub fn iter(&self) -> impl Iterator<Item = (&TaskType, &String)> {
        self.0.iter()
    }

    /// Whether the map has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(TaskType, String)> for ModelMap {
    fn from_iter<I: IntoIterator<Item = (TaskType, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A configured upstream endpoint
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Identifier
    pub id: ProviderId,
    /// Provider family
    pub kind: ProviderKind,
    /// Unique display name
    pub name: String,
    /// Absolute http(s) URL without trailing slash
    pub base_url: String,
    /// Decrypted credential
    pub api_key: SecretString,
    /// Task → model mapping
    pub model_map: ModelMap,
    /// Lower is tried first
    pub priority: i32,
    /// Disabled providers are never routed to
    pub enabled: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a provider
#[derive(Debug, Clone)]
pub struct NewProviderConfig {
    /// Provider family
    pub kind: ProviderKind,
    /// Unique display name
    pub name: String,
    /// Base URL (normalised on validation)
    pub base_url: String,
    /// Credential
    pub api_key: SecretString,
    /// Task → model mapping
    pub model_map: ModelMap,
    /// Lower is tried first
    pub priority: i32,
    /// Routing flag
    pub enabled: bool,
}

impl NewProviderConfig {
    /// Create a payload with default priority, enabled
    pub fn new(
        kind: ProviderKind,
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            base_url: base_url.into(),
            api_key: SecretString::new(api_key.into()),
            model_map: ModelMap::new(),
            priority: DEFAULT_PRIORITY,
            enabled: true,
        }
    }

    /// Set the model map
    #[must_use]
    pub fn with_model_map(mut self, model_map: ModelMap) -> Self {
        self.model_map = model_map;
        self
    }

    /// Set the priority
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the enabled flag
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Check the name and normalise the base URL.
    ///
    /// # Errors
    /// Returns a validation error for a blank name or a bad base URL
    pub fn validated(mut self) -> GatewayResult<Self> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(GatewayError::validation("provider name cannot be empty", Some("name")));
        }
        self.name = name.to_string();
        self.base_url = normalize_base_url(&self.base_url)?;
        Ok(self)
    }

    /// Materialise a stored config
    #[must_use]
    pub fn into_config(self, id: ProviderId, created_at: DateTime<Utc>) -> ProviderConfig {
        ProviderConfig {
            id,
            kind: self.kind,
            name: self.name,
            base_url: self.base_url,
            api_key: self.api_key,
            model_map: self.model_map,
            priority: self.priority,
            enabled: self.enabled,
            created_at,
        }
    }
}

/// Partial update of a provider; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct ProviderConfigUpdate {
    /// New base URL
    pub base_url: Option<String>,
    /// New credential
    pub api_key: Option<SecretString>,
    /// New model map
    pub model_map: Option<ModelMap>,
    /// New priority
    pub priority: Option<i32>,
    /// New enabled flag
    pub enabled: Option<bool>,
}

impl ProviderConfigUpdate {
    /// Apply the update in place.
    ///
    /// # Errors
    /// Returns a validation error if the new base URL is invalid; the
    /// config is left untouched in that case.
    pub fn apply(self, config: &mut ProviderConfig) -> GatewayResult<()> {
        let base_url = self
            .base_url
            .as_deref()
            .map(normalize_base_url)
            .transpose()?;

        if let Some(base_url) = base_url {
            config.base_url = base_url;
        }
        if let Some(api_key) = self.api_key {
            config.api_key = api_key;
        }
        if let Some(model_map) = self.model_map {
            config.model_map = model_map;
        }
        if let Some(priority) = self.priority {
            config.priority = priority;
        }
        if let Some(enabled) = self.enabled {
            config.enabled = enabled;
        }
        Ok(())
    }

    /// Whether the update changes nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.base_url.is_none()
            && self.api_key.is_none()
            && self.model_map.is_none()
            && self.priority.is_none()
            && self.enabled.is_none()
    }
}

/// Validate an absolute http(s) base URL and strip trailing slashes.
///
/// # Errors
/// Returns a validation error if the URL does not parse, has another
/// scheme, or has no host
pub fn normalize_base_url(raw: &str) -> GatewayResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed).map_err(|e| {
        GatewayError::validation(format!("invalid base URL '{raw}': {e}"), Some("base_url"))
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(GatewayError::validation(
            format!("base URL must use http or https, got '{}'", parsed.scheme()),
            Some("base_url"),
        ));
    }
    if parsed.host_str().is_none() {
        return Err(GatewayError::validation(
            format!("base URL '{raw}' has no host"),
            Some("base_url"),
        ));
    }

    Ok(trimmed.to_string())
}

/// Uniform contract over one provider family's wire API.
///
/// Implementations must never fail outward: transport errors, non-2xx
/// statuses and unexpected bodies all come back as a failed
/// [`ProviderResult`].
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider family
    fn kind(&self) -> ProviderKind;

    /// Model map the adapter was built with
    fn model_map(&self) -> &ModelMap;

    /// Model to use for a task
    fn model_for(&self, task: TaskType) -> &str {
        self.model_map().resolve(task)
    }

    /// Single-turn text completion
    async fn chat(&self, request: &ProviderRequest) -> ProviderResult;

    /// Completion with image references.
    ///
    /// The default degrades to [`chat`](Self::chat) with the image
    /// references appended to the prompt.
    async fn vision(&self, request: &ProviderRequest) -> ProviderResult {
        self.chat(&request.with_image_hints("Image URLs")).await
    }

    /// Liveness check; any status below 500 counts as reachable
    async fn health_check(&self) -> ProviderResult;
}

/// Builds adapters for configured providers.
pub trait AdapterFactory: Send + Sync {
    /// Build the adapter for a provider
    ///
    /// # Errors
    /// Returns an error if the adapter cannot be constructed
    fn build(&self, config: &ProviderConfig) -> GatewayResult<Arc<dyn ProviderAdapter>>;
}
