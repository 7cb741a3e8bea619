//! Google Gemini provider implementation.
//!
//! # API Format
//! `POST {base_url}/models/{MODEL}:generateContent?key={API_KEY}`
//!
//! `data:` image URLs are sent as `inlineData` parts. Gemini cannot fetch
//! remote URLs itself, so those are listed in the prompt instead.

use crate::common::{check_reachable, parse_data_url, send_json, timed, AdapterTimeouts};
use async_trait::async_trait;
use gateway_core::{
    append_image_hints, ModelMap, ProviderAdapter, ProviderKind, ProviderRequest, ProviderResult,
    UpstreamError,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Adapter for the Gemini `generateContent` API
pub struct GeminiAdapter {
    base_url: String,
    api_key: SecretString,
    model_map: ModelMap,
    client: Client,
    timeouts: AdapterTimeouts,
}

impl std::fmt::Debug for GeminiAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiAdapter")
            .field("base_url", &self.base_url)
            .field("model_map", &self.model_map)
            .finish_non_exhaustive()
    }
}

impl GeminiAdapter {
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

    fn endpoint_url(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    fn transform_request(&self, request: &ProviderRequest, with_images: bool) -> GeminiRequest {
        let mut inline = Vec::new();
        let mut remote = Vec::new();
        if with_images {
            for url in &request.image_urls {
                match parse_data_url(url) {
                    Some((mime_type, data)) => inline.push(GeminiPart::InlineData {
                        inline_data: GeminiInlineData { mime_type, data },
                    }),
                    None => remote.push(url.as_str()),
                }
            }
        }

        let mut parts = vec![GeminiPart::Text {
            text: append_image_hints(&request.prompt, "Images", &remote),
        }];
        parts.extend(inline);

        GeminiRequest {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiGenerationConfig {
                temperature: request.temperature,
            },
        }
    }

    async fn complete(&self, request: &ProviderRequest, with_images: bool) -> ProviderResult {
        let model = self.model_for(request.task);
        let url = self.endpoint_url(model);
        let body = self.transform_request(request, with_images);

        debug!(provider = "gemini", model = %model, url = %url, "Sending generateContent request");

        let http = self
            .client
            .post(url)
            .query(&[("key", self.api_key.expose_secret().as_str())])
            .timeout(self.timeouts.completion);

        timed("gemini", async {
            let response: GeminiResponse = send_json(http, &body).await?;
            Self::extract_content(response)
        })
        .await
    }

    fn extract_content(response: GeminiResponse) -> Result<String, UpstreamError> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::Shape("no candidates in response".to_string()))?;

        let texts: Vec<String> = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        if texts.is_empty() {
            return Err(UpstreamError::Shape("candidate has no text parts".to_string()));
        }
        Ok(texts.concat())
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn model_map(&self) -> &ModelMap {
        &self.model_map
    }

    async fn chat(&self, request: &ProviderRequest) -> ProviderResult {
        self.complete(request, false).await
    }

    async fn vision(&self, request: &ProviderRequest) -> ProviderResult {
        self.complete(request, true).await
    }

    async fn health_check(&self) -> ProviderResult {
        check_reachable(&self.client, &self.base_url, self.timeouts.health).await
    }
}

// Gemini API Types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}
