//! Anthropic Claude provider implementation.
//!
//! # API Format
//! `POST {base_url}/messages` with `x-api-key` and `anthropic-version`
//! headers. Image references are not sent natively: `vision` falls back to
//! the trait default, which lists them in the prompt.

use crate::common::{check_reachable, send_json, timed, AdapterTimeouts};
use async_trait::async_trait;
use gateway_core::{
    ModelMap, ProviderAdapter, ProviderKind, ProviderRequest, ProviderResult, UpstreamError,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Value sent in the `anthropic-version` header
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Output token cap for every request
pub const MAX_TOKENS: u32 = 800;

/// Adapter for the Claude messages API
pub struct ClaudeAdapter {
    base_url: String,
    api_key: SecretString,
    model_map: ModelMap,
    client: Client,
    timeouts: AdapterTimeouts,
}

impl std::fmt::Debug for ClaudeAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeAdapter")
            .field("base_url", &self.base_url)
            .field("model_map", &self.model_map)
            .finish_non_exhaustive()
    }
}

impl ClaudeAdapter {
    /// Create an adapter
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        api_key: SecretString,
        model_map: ModelMap,
        client: Client,
        timeouts: AdapterTimeouts,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model_map,
            client,
            timeouts,
        }
    }

    fn endpoint_url(&self) -> String {
        format!("{}/messages", self.base_url)
    }

    fn transform_request(&self, request: &ProviderRequest) -> MessagesRequest {
        MessagesRequest {
            model: self.model_for(request.task).to_string(),
            max_tokens: MAX_TOKENS,
            temperature: request.temperature,
            messages: vec![Message {
                role: "user",
                content: request.prompt.clone(),
            }],
        }
    }

    fn extract_content(response: MessagesResponse) -> Result<String, UpstreamError> {
        response
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| UpstreamError::Shape("no text block in response".to_string()))
    }
}

#[async_trait]
impl ProviderAdapter for ClaudeAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    fn model_map(&self) -> &ModelMap {
        &self.model_map
    }

    async fn chat(&self, request: &ProviderRequest) -> ProviderResult {
        let body = self.transform_request(request);
        debug!(provider = "claude", model = %body.model, "Sending messages request");

        let http = self
            .client
            .post(self.endpoint_url())
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(self.timeouts.completion);

        timed("claude", async {
            let response: MessagesResponse = send_json(http, &body).await?;
            Self::extract_content(response)
        })
        .await
    }

    async fn health_check(&self) -> ProviderResult {
        check_reachable(&self.client, &self.base_url, self.timeouts.health).await
    }
}

// Anthropic API Types

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}
