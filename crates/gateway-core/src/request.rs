//! Request types for the gateway.
//!
//! This module defines the uniform request handed to every provider adapter.

use crate::types::TaskType;
use serde::{Deserialize, Serialize};

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Uniform single-turn request sent to a provider adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// Task used to pick the model
    pub task: TaskType,

    /// Prompt text
    pub prompt: String,

    /// Image references (URLs or `data:` URLs)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

impl ProviderRequest {
    /// Create a text-only request with the default temperature
    pub fn new(task: TaskType, prompt: impl Into<String>) -> Self {
        Self {
            task,
            prompt: prompt.into(),
            image_urls: Vec::new(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Attach image references
    #[must_use]
    pub fn with_images(mut self, image_urls: Vec<String>) -> Self {
        self.image_urls = image_urls;
        self
    }

    /// Set the temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Whether the request carries images
    #[must_use]
    pub fn has_images(&self) -> bool {
        !self.image_urls.is_empty()
    }

    /// Text-only copy of the request with the image references listed
    /// under `heading` at the end of the prompt.
    #[must_use]
    pub fn with_image_hints(&self, heading: &str) -> Self {
        Self {
            task: self.task,
            prompt: append_image_hints(&self.prompt, heading, &self.image_urls),
            image_urls: Vec::new(),
            temperature: self.temperature,
        }
    }
}

/// Append `heading:` followed by one reference per line; the prompt is
/// returned unchanged when there are no references.
#[must_use]
pub fn append_image_hints<S: AsRef<str>>(prompt: &str, heading: &str, image_urls: &[S]) -> String {
    if image_urls.is_empty() {
        return prompt.to_string();
    }
    let hints = image_urls
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n");
    format!("{prompt}\n{heading}:\n{hints}")
}
