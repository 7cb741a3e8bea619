//! Routing integration tests
//!
//! Fallback across provider families, retries, priorities, timeouts and
//! metrics, all over real HTTP.

use crate::fixtures::*;
use crate::helpers::*;
use crate::mock_providers::*;
use gateway_core::{CallStatus, FallbackResponse, ProviderConfigUpdate, ProviderId, TaskType};
use gateway_routing::RouterConfig;
use gateway_telemetry::RequestOutcome;
use pretty_assertions::assert_eq;
use std::time::Duration;

/// Transient failure is retried on the same provider
#[tokio::test]
async fn test_retry_then_success() {
    let mock = MockProvider::openai().await;
    mock.mock_error_times(503, "busy", 1).await;
    mock.mock_success("recovered").await;

    let gateway = TestGateway::in_memory(fast_config());
    gateway.add(provider_for(&mock, "openai", 1)).await;

    let response = gateway
        .router
        .call_with_fallback(TaskType::Default, "hi", &[])
        .await
        .unwrap();
    assert!(response.ok);
    assert_eq!(response.attempt, Some(2));
    assert_eq!(
        gateway.log_statuses().await,
        vec![(1, CallStatus::Failed), (1, CallStatus::Ok)]
    );
}

/// An exhausted provider falls through to the next family
#[tokio::test]
async fn test_fallback_across_families() {
    let openai = MockProvider::openai().await;
    openai.mock_error(500, "boom").await;
    let gemini = MockProvider::gemini().await;
    gemini.mock_error(429, "quota").await;
    let claude = MockProvider::claude().await;
    claude.mock_success("third time lucky").await;

    let gateway = TestGateway::in_memory(fast_config());
    gateway.add(provider_for(&openai, "openai", 1)).await;
    gateway.add(provider_for(&gemini, "gemini", 2)).await;
    gateway.add(provider_for(&claude, "claude", 3)).await;

    let response = gateway
        .router
        .call_with_fallback(TaskType::Recommend, "advise me", &[])
        .await
        .unwrap();
    assert_eq!(response.content, "third time lucky");
    assert_eq!(response.provider_id, Some(ProviderId(3)));
    assert_eq!(response.attempt, Some(1));

    assert_eq!(
        gateway.log_statuses().await,
        vec![
            (1, CallStatus::Failed),
            (1, CallStatus::Failed),
            (2, CallStatus::Failed),
            (2, CallStatus::Failed),
            (3, CallStatus::Ok),
        ]
    );
    assert_eq!(openai.completion_calls().await, 2);
    assert_eq!(gemini.completion_calls().await, 2);
}

/// Lower priority value wins regardless of registration order
#[tokio::test]
async fn test_priority_order() {
    let first = MockProvider::openai().await;
    first.mock_success("from first").await;
    let second = MockProvider::claude().await;
    second.mock_success("from second").await;

    let gateway = TestGateway::in_memory(fast_config());
    gateway.add(provider_for(&second, "second", 20)).await;
    gateway.add(provider_for(&first, "first", 10)).await;

    let response = gateway
        .router
        .call_with_fallback(TaskType::Default, "hi", &[])
        .await
        .unwrap();
    assert_eq!(response.content, "from first");
    assert_eq!(second.completion_calls().await, 0);
}

/// Disabled providers are never called
#[tokio::test]
async fn test_disabled_provider_skipped_silently() {
    let disabled = MockProvider::openai().await;
    disabled.mock_success("should not be used").await;
    let enabled = MockProvider::gemini().await;
    enabled.mock_success("enabled answer").await;

    let gateway = TestGateway::in_memory(fast_config());
    let off = gateway.add(provider_for(&disabled, "off", 1)).await;
    gateway.add(provider_for(&enabled, "on", 2)).await;
    gateway
        .router
        .registry()
        .update(
            off.id,
            ProviderConfigUpdate {
                enabled: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let response = gateway
        .router
        .call_with_fallback(TaskType::Default, "hi", &[])
        .await
        .unwrap();
    assert_eq!(response.content, "enabled answer");
    assert_eq!(disabled.completion_calls().await, 0);
    // No log entry at all for the disabled provider
    assert_eq!(gateway.log_statuses().await, vec![(2, CallStatus::Ok)]);
}

/// No providers at all
#[tokio::test]
async fn test_no_providers() {
    let gateway = TestGateway::in_memory(fast_config());
    let response = gateway
        .router
        .call_with_fallback(TaskType::Default, "hi", &[])
        .await
        .unwrap();
    assert_eq!(response, FallbackResponse::failure(FallbackResponse::NO_ENABLED_PROVIDERS));
    assert!(gateway.log_entries().await.is_empty());
}

/// A slow provider is cut off by the attempt timeout and the chain moves on
#[tokio::test]
async fn test_attempt_timeout_moves_on() {
    let slow = MockProvider::openai().await;
    slow.mock_delayed("too late", Duration::from_secs(3)).await;
    let fast = MockProvider::claude().await;
    fast.mock_success("on time").await;

    let config = RouterConfig::builder()
        .max_retries(1)
        .retry_backoff(Duration::ZERO)
        .attempt_timeout(Duration::from_millis(200))
        .build();
    let gateway = TestGateway::in_memory(config);
    gateway.add(provider_for(&slow, "slow", 1)).await;
    gateway.add(provider_for(&fast, "fast", 2)).await;

    let response = gateway
        .router
        .call_with_fallback(TaskType::Default, "hi", &[])
        .await
        .unwrap();
    assert_eq!(response.content, "on time");

    let entries = gateway.log_entries().await;
    assert_eq!(entries[0].status, CallStatus::Failed);
    assert_eq!(
        entries[0].error_message.as_deref(),
        Some("attempt timed out after 200ms")
    );
    assert!(entries[0].latency_ms >= 150);
    assert_eq!(entries[1].status, CallStatus::Ok);
}

/// The request deadline stops the whole chain
#[tokio::test]
async fn test_request_deadline() {
    let slow = MockProvider::gemini().await;
    slow.mock_delayed("too late", Duration::from_secs(3)).await;
    let never = MockProvider::claude().await;
    never.mock_success("never reached").await;

    let config = RouterConfig::builder()
        .retry_backoff(Duration::ZERO)
        .request_timeout(Duration::from_millis(300))
        .build();
    let gateway = TestGateway::in_memory(config);
    gateway.add(provider_for(&slow, "slow", 1)).await;
    gateway.add(provider_for(&never, "never", 2)).await;

    let response = gateway
        .router
        .call_with_fallback(TaskType::Default, "hi", &[])
        .await
        .unwrap();
    assert!(!response.ok);
    assert_eq!(response.error.as_deref(), Some(FallbackResponse::DEADLINE_EXCEEDED));
    assert_eq!(never.completion_calls().await, 0);

    let entries = gateway.log_entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].error_message.as_deref(),
        Some(FallbackResponse::DEADLINE_EXCEEDED)
    );
}

/// Concurrent calls each get their own chain and log entries
#[tokio::test]
async fn test_concurrent_calls() {
    let mock = MockProvider::openai().await;
    mock.mock_success("shared").await;

    let gateway = TestGateway::in_memory(fast_config());
    gateway.add(provider_for(&mock, "openai", 1)).await;

    let calls = (0..8).map(|i| {
        let router = gateway.router.clone();
        async move {
            router
                .call_with_fallback(TaskType::Emotion, &format!("prompt {i}"), &[])
                .await
        }
    });
    let responses = futures::future::join_all(calls).await;

    assert!(responses.iter().all(|r| r.as_ref().unwrap().ok));
    assert_eq!(gateway.log_entries().await.len(), 8);
    assert_eq!(mock.completion_calls().await, 8);
}

/// Attempts and outcomes are counted in the metrics registry
#[tokio::test]
async fn test_metrics_follow_the_log() {
    let failing = MockProvider::openai().await;
    failing.mock_error(502, "bad gateway").await;
    let working = MockProvider::claude().await;
    working.mock_success("ok").await;

    let gateway = TestGateway::in_memory(fast_config());
    gateway.add(provider_for(&failing, "failing", 1)).await;
    gateway.add(provider_for(&working, "working", 2)).await;

    gateway
        .router
        .call_with_fallback(TaskType::Vision, "hi", &[])
        .await
        .unwrap();

    let metrics = gateway.router.metrics().unwrap();
    assert_eq!(
        metrics.attempt_count(ProviderId(1), TaskType::Vision, CallStatus::Failed),
        2
    );
    assert_eq!(metrics.attempt_count(ProviderId(2), TaskType::Vision, CallStatus::Ok), 1);
    assert_eq!(metrics.outcome_count(TaskType::Vision, RequestOutcome::Success), 1);

    let rendered = metrics.render().unwrap();
    assert!(rendered.contains("meal_gateway_provider_attempts_total"));
    assert!(rendered.contains("meal_gateway_requests_total"));
}
