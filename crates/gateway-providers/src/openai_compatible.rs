//! OpenAI-compatible provider implementation.
//!
//! Serves both `openai_compatible` endpoints and `new_api` relays, which
//! speak the same chat-completions dialect.
//!
//! # API Format
//! `POST {base_url}/chat/completions` with bearer authentication.

use crate::common::{check_reachable, send_json, timed, AdapterTimeouts};
use async_trait::async_trait;
use gateway_core::{
    ModelMap, ProviderAdapter, ProviderKind, ProviderRequest, ProviderResult, UpstreamError,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Adapter for OpenAI chat-completions compatible endpoints
pub struct OpenAICompatibleAdapter {
    kind: ProviderKind,
    base_url: String,
    api_key: SecretString,
    model_map: ModelMap,
    client: Client,
    timeouts: AdapterTimeouts,
}

impl std::fmt::Debug for OpenAICompatibleAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAICompatibleAdapter")
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("model_map", &self.model_map)
            .finish_non_exhaustive()
    }
}

impl OpenAICompatibleAdapter {
    /// Create an adapter; `kind` is `OpenaiCompatible` or `NewApi`
    #[must_use]
    pub fn new(
        kind: ProviderKind,
        base_url: impl Into<String>,
        api_key: SecretString,
        model_map: ModelMap,
        client: Client,
        timeouts: AdapterTimeouts,
    ) -> Self {
        Self {
            kind,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model_map,
            client,
            timeouts,
        }
    }

    fn endpoint_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn transform_request(&self, request: &ProviderRequest, with_images: bool) -> ChatRequest {
        let content = if with_images && request.has_images() {
            let mut parts = vec![ContentPart::Text {
                text: request.prompt.clone(),
            }];
            parts.extend(request.image_urls.iter().map(|url| ContentPart::ImageUrl {
                image_url: ImageUrl { url: url.clone() },
            }));
            MessageContent::Parts(parts)
        } else {
            MessageContent::Text(request.prompt.clone())
        };

        ChatRequest {
            model: self.model_for(request.task).to_string(),
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            temperature: request.temperature,
        }
    }

    async fn complete(&self, body: ChatRequest, timeout: Duration) -> ProviderResult {
        debug!(
            provider = self.kind.as_str(),
            model = %body.model,
            url = %self.endpoint_url(),
            "Sending chat completion request"
        );

        let request = self
            .client
            .post(self.endpoint_url())
            .bearer_auth(self.api_key.expose_secret())
            .timeout(timeout);

        timed(self.kind.as_str(), async {
            let response: ChatResponse = send_json(request, &body).await?;
            Self::extract_content(response)
        })
        .await
    }

    fn extract_content(response: ChatResponse) -> Result<String, UpstreamError> {
        response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::Shape("no choices in response".to_string()))?
            .message
            .content
            .ok_or_else(|| UpstreamError::Shape("choice has no message content".to_string()))
    }
}

#[async_trait]
impl ProviderAdapter for OpenAICompatibleAdapter {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model_map(&self) -> &ModelMap {
        &self.model_map
    }

    async fn chat(&self, request: &ProviderRequest) -> ProviderResult {
        let body = self.transform_request(request, false);
        self.complete(body, self.timeouts.chat).await
    }

    async fn vision(&self, request: &ProviderRequest) -> ProviderResult {
        let body = self.transform_request(request, true);
        self.complete(body, self.timeouts.completion).await
    }

    async fn health_check(&self) -> ProviderResult {
        check_reachable(&self.client, &self.base_url, self.timeouts.health).await
    }
}

// OpenAI API Types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}
