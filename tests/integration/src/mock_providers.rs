//! Mock LLM providers for integration testing
//!
//! Wiremock servers speaking the OpenAI-compatible, Gemini and Anthropic
//! wire formats at the paths the adapters call.

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Model used by the mock Gemini server
pub const GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Which wire format a mock speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockKind {
    /// `POST {base}/chat/completions`
    OpenAi,
    /// `POST {base}/models/{model}:generateContent?key=`
    Gemini,
    /// `POST {base}/messages`
    Claude,
}

/// A mock upstream provider
pub struct MockProvider {
    pub server: MockServer,
    pub kind: MockKind,
}

impl MockProvider {
    /// Start a mock speaking `kind`
    pub async fn start(kind: MockKind) -> Self {
        Self {
            server: MockServer::start().await,
            kind,
        }
    }

    /// Mock OpenAI-compatible server
    pub async fn openai() -> Self {
        Self::start(MockKind::OpenAi).await
    }

    /// Mock Gemini server
    pub async fn gemini() -> Self {
        Self::start(MockKind::Gemini).await
    }

    /// Mock Anthropic server
    pub async fn claude() -> Self {
        Self::start(MockKind::Claude).await
    }

    /// Base URL to register in the provider table
    pub fn base_url(&self) -> String {
        match self.kind {
            MockKind::OpenAi | MockKind::Claude => format!("{}/v1", self.server.uri()),
            MockKind::Gemini => format!("{}/v1beta", self.server.uri()),
        }
    }

    fn completion_path(&self) -> String {
        match self.kind {
            MockKind::OpenAi => "/v1/chat/completions".to_string(),
            MockKind::Gemini => format!("/v1beta/models/{GEMINI_MODEL}:generateContent"),
            MockKind::Claude => "/v1/messages".to_string(),
        }
    }

    fn success_body(&self, content: &str) -> Value {
        match self.kind {
            MockKind::OpenAi => openai_chat_response(content),
            MockKind::Gemini => gemini_response(content),
            MockKind::Claude => anthropic_response(content),
        }
    }

    /// Answer every completion with `content`
    pub async fn mock_success(&self, content: &str) {
        Mock::given(method("POST"))
            .and(path(self.completion_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(self.success_body(content)))
            .mount(&self.server)
            .await;
    }

    /// Answer the first `times` completions with `status`, then fall
    /// through to later mocks
    pub async fn mock_error_times(&self, status: u16, message: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path(self.completion_path()))
            .respond_with(ResponseTemplate::new(status).set_body_json(error_response(message)))
            .up_to_n_times(times)
            .mount(&self.server)
            .await;
    }

    /// Answer every completion with `status`
    pub async fn mock_error(&self, status: u16, message: &str) {
        Mock::given(method("POST"))
            .and(path(self.completion_path()))
            .respond_with(ResponseTemplate::new(status).set_body_json(error_response(message)))
            .mount(&self.server)
            .await;
    }

    /// Answer every completion after `delay`
    pub async fn mock_delayed(&self, content: &str, delay: Duration) {
        Mock::given(method("POST"))
            .and(path(self.completion_path()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(self.success_body(content))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Answer the base URL health check with `status`
    pub async fn mock_health(&self, status: u16) {
        let health_path = match self.kind {
            MockKind::OpenAi | MockKind::Claude => "/v1",
            MockKind::Gemini => "/v1beta",
        };
        Mock::given(method("GET"))
            .and(path(health_path))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Require the credential in the provider's auth style
    pub async fn mock_authenticated_success(&self, api_key: &str, content: &str) {
        let mock = Mock::given(method("POST")).and(path(self.completion_path()));
        let mock = match self.kind {
            MockKind::OpenAi => mock.and(header("authorization", format!("Bearer {api_key}"))),
            MockKind::Gemini => mock.and(query_param("key", api_key)),
            MockKind::Claude => mock
                .and(header("x-api-key", api_key))
                .and(header("anthropic-version", gateway_providers::ANTHROPIC_VERSION)),
        };
        mock.respond_with(ResponseTemplate::new(200).set_body_json(self.success_body(content)))
            .mount(&self.server)
            .await;
    }

    /// Completion requests received so far
    pub async fn completion_calls(&self) -> usize {
        let wanted = self.completion_path();
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str() == "POST" && r.url.path() == wanted)
            .count()
    }

    /// Parsed JSON bodies of completion requests received so far
    pub async fn completion_bodies(&self) -> Vec<Value> {
        let wanted = self.completion_path();
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == wanted)
            .filter_map(|r| serde_json::from_slice(&r.body).ok())
            .collect()
    }
}

/// OpenAI chat completion body
pub fn openai_chat_response(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30 }
    })
}

/// Gemini generateContent body
pub fn gemini_response(content: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": content }] },
            "finishReason": "STOP"
        }]
    })
}

/// Anthropic messages body
pub fn anthropic_response(content: &str) -> Value {
    json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "model": "claude-3-5-haiku-latest",
        "content": [{ "type": "text", "text": content }],
        "stop_reason": "end_turn"
    })
}

/// `{"error":{"message":..}}` body shared by all three APIs
pub fn error_response(message: &str) -> Value {
    json!({ "error": { "message": message, "type": "server_error" } })
}
