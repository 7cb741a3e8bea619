//! Plumbing shared by the HTTP adapters.

use gateway_config::AdapterSettings;
use gateway_core::{GatewayError, GatewayResult, ProviderResult, UpstreamError};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Content returned by a successful health check
pub const REACHABLE: &str = "provider reachable";

/// Per-call HTTP timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterTimeouts {
    /// OpenAI-compatible text completions
    pub chat: Duration,
    /// OpenAI vision and every Gemini or Claude completion
    pub completion: Duration,
    /// Health checks
    pub health: Duration,
}

impl Default for AdapterTimeouts {
    fn default() -> Self {
        Self {
            chat: Duration::from_secs(25),
            completion: Duration::from_secs(30),
            health: Duration::from_secs(10),
        }
    }
}

impl From<&AdapterSettings> for AdapterTimeouts {
    fn from(settings: &AdapterSettings) -> Self {
        Self {
            chat: settings.chat_timeout,
            completion: settings.completion_timeout,
            health: settings.health_timeout,
        }
    }
}

/// Build the shared HTTP client.
///
/// Timeouts are set per request, not on the client.
pub fn build_client() -> GatewayResult<Client> {
    Client::builder()
        .pool_max_idle_per_host(16)
        .user_agent(concat!("meal-advisor-gateway/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| GatewayError::internal(format!("Failed to create HTTP client: {e}")))
}

/// Milliseconds elapsed since `start`
pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Transport failure without the request URL (which may carry a key).
pub(crate) fn transport(err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        return UpstreamError::Transport("request timed out".to_string());
    }
    UpstreamError::Transport(err.without_url().to_string())
}

/// Send a JSON body and decode a JSON answer.
pub(crate) async fn send_json<B, R>(request: RequestBuilder, body: &B) -> Result<R, UpstreamError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = request.json(body).send().await.map_err(transport)?;
    let status = response.status();
    let text = response.text().await.map_err(transport)?;

    if !status.is_success() {
        return Err(UpstreamError::from_status(status.as_u16(), &text));
    }
    trace!(status = status.as_u16(), bytes = text.len(), "Upstream response");

    serde_json::from_str(&text)
        .map_err(|e| UpstreamError::Shape(format!("invalid response JSON: {e}")))
}

/// Run one network call, timing it and folding failures into the result.
pub(crate) async fn timed<F>(provider: &'static str, call: F) -> ProviderResult
where
    F: Future<Output = Result<String, UpstreamError>>,
{
    let start = Instant::now();
    let outcome = call.await;
    let latency_ms = elapsed_ms(start);

    match outcome {
        Ok(content) => {
            debug!(provider, latency_ms, "Completion succeeded");
            ProviderResult::success(content, latency_ms)
        }
        Err(error) => {
            debug!(provider, latency_ms, error = %error, "Completion failed");
            ProviderResult::failure(error.to_string(), latency_ms)
        }
    }
}

/// Unauthenticated GET against the base URL; any status below 500 counts
/// as reachable.
pub(crate) async fn check_reachable(client: &Client, base_url: &str, timeout: Duration) -> ProviderResult {
    let start = Instant::now();
    let outcome = client.get(base_url).timeout(timeout).send().await;
    let latency_ms = elapsed_ms(start);

    match outcome {
        Ok(response) if response.status().as_u16() < 500 => {
            ProviderResult::success(REACHABLE, latency_ms)
        }
        Ok(response) => {
            ProviderResult::failure(format!("status={}", response.status().as_u16()), latency_ms)
        }
        Err(e) => ProviderResult::failure(transport(e).to_string(), latency_ms),
    }
}

/// `(mime_type, base64 payload)` of a `data:` URL
pub(crate) fn parse_data_url(url: &str) -> Option<(String, String)> {
    let without_prefix = url.strip_prefix("data:")?;
    let (meta, data) = without_prefix.split_once(',')?;

    let mime_type = meta.strip_suffix(";base64").unwrap_or(meta);
    if mime_type.is_empty() || data.is_empty() {
        return None;
    }
    Some((mime_type.to_string(), data.to_string()))
}
