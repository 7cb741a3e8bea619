//! Circuit breaker integration tests
//!
//! The circuit is derived from the call log, so these drive real failures
//! through the router and check what later calls do.

use crate::fixtures::*;
use crate::helpers::*;
use crate::mock_providers::*;
use gateway_core::{CallStatus, ProviderId, TaskType};
use gateway_resilience::CircuitState;
use gateway_routing::RouterConfig;
use pretty_assertions::assert_eq;
use std::time::Duration;

fn breaker_config(threshold: u32, window: Duration) -> RouterConfig {
    RouterConfig::builder()
        .max_retries(2)
        .retry_backoff(Duration::ZERO)
        .circuit_failure_threshold(threshold)
        .circuit_window(window)
        .build()
}

async fn two_providers(config: RouterConfig) -> (TestGateway, MockProvider, MockProvider) {
    let failing = MockProvider::openai().await;
    failing.mock_error(503, "down").await;
    let healthy = MockProvider::claude().await;
    healthy.mock_success("healthy").await;

    let gateway = TestGateway::in_memory(config);
    gateway.add(provider_for(&failing, "failing", 1)).await;
    gateway.add(provider_for(&healthy, "healthy", 2)).await;
    (gateway, failing, healthy)
}

/// Consecutive failures open the circuit and later calls skip the provider
#[tokio::test]
async fn test_open_circuit_skips_provider() {
    let (gateway, failing, _healthy) = two_providers(breaker_config(2, Duration::from_secs(300))).await;

    for _ in 0..3 {
        let response = gateway
            .router
            .call_with_fallback(TaskType::Default, "hi", &[])
            .await
            .unwrap();
        assert_eq!(response.content, "healthy");
    }

    // Only the first call reached the failing upstream
    assert_eq!(failing.completion_calls().await, 2);
    assert_eq!(
        gateway.log_statuses().await,
        vec![
            (1, CallStatus::Failed),
            (1, CallStatus::Failed),
            (2, CallStatus::Ok),
            (1, CallStatus::SkippedCircuitOpen),
            (2, CallStatus::Ok),
            (1, CallStatus::SkippedCircuitOpen),
            (2, CallStatus::Ok),
        ]
    );

    let overview = gateway.router.circuit_overview(TaskType::Default).await.unwrap();
    assert_eq!(overview[0].provider_id, ProviderId(1));
    assert_eq!(overview[0].evaluation.state, CircuitState::Open);
    assert_eq!(overview[1].evaluation.state, CircuitState::Closed);
}

/// Circuits are tracked per task
#[tokio::test]
async fn test_circuit_is_per_task() {
    let (gateway, failing, _healthy) = two_providers(breaker_config(2, Duration::from_secs(300))).await;

    gateway
        .router
        .call_with_fallback(TaskType::Default, "hi", &[])
        .await
        .unwrap();
    gateway
        .router
        .call_with_fallback(TaskType::Emotion, "hi", &[])
        .await
        .unwrap();

    // The emotion task still tried the failing provider
    assert_eq!(failing.completion_calls().await, 4);
    let emotion = gateway.router.circuit_overview(TaskType::Emotion).await.unwrap();
    assert!(emotion[0].evaluation.is_open());
}

/// Failures older than the window no longer count
#[tokio::test]
async fn test_circuit_closes_after_window() {
    let (gateway, failing, _healthy) = two_providers(breaker_config(2, Duration::from_millis(500))).await;

    gateway
        .router
        .call_with_fallback(TaskType::Default, "hi", &[])
        .await
        .unwrap();
    let overview = gateway.router.circuit_overview(TaskType::Default).await.unwrap();
    assert!(overview[0].evaluation.is_open());

    tokio::time::sleep(Duration::from_millis(700)).await;

    gateway
        .router
        .call_with_fallback(TaskType::Default, "hi", &[])
        .await
        .unwrap();
    // Tried again after the window passed
    assert_eq!(failing.completion_calls().await, 4);
}

/// A success resets the streak
#[tokio::test]
async fn test_success_resets_streak() {
    let flaky = MockProvider::gemini().await;
    flaky.mock_error_times(500, "blip", 1).await;
    flaky.mock_success("fine").await;

    let gateway = TestGateway::in_memory(breaker_config(2, Duration::from_secs(300)));
    gateway.add(provider_for(&flaky, "flaky", 1)).await;

    for _ in 0..3 {
        let response = gateway
            .router
            .call_with_fallback(TaskType::Default, "hi", &[])
            .await
            .unwrap();
        assert_eq!(response.content, "fine");
    }
    let overview = gateway.router.circuit_overview(TaskType::Default).await.unwrap();
    assert_eq!(overview[0].evaluation.state, CircuitState::Closed);
    assert_eq!(overview[0].evaluation.consecutive_failures, 0);
}

/// Threshold zero disables the breaker
#[tokio::test]
async fn test_threshold_zero_never_opens() {
    let (gateway, failing, _healthy) = two_providers(breaker_config(0, Duration::from_secs(300))).await;

    for _ in 0..3 {
        gateway
            .router
            .call_with_fallback(TaskType::Default, "hi", &[])
            .await
            .unwrap();
    }
    assert_eq!(failing.completion_calls().await, 6);
    assert!(!gateway
        .log_statuses()
        .await
        .iter()
        .any(|(_, status)| *status == CallStatus::SkippedCircuitOpen));
}
