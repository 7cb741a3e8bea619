//! Provider integration tests
//!
//! Real adapters against wiremock servers: authentication styles, request
//! bodies, error mapping and health checks.

use crate::fixtures::*;
use crate::helpers::*;
use crate::mock_providers::*;
use gateway_core::{CallStatus, FallbackResponse, ProviderId, TaskType};
use gateway_routing::RouterConfig;
use pretty_assertions::assert_eq;

/// Each family authenticates its own way and its answer is extracted
#[tokio::test]
async fn test_each_family_answers_with_its_auth_style() {
    for kind in [MockKind::OpenAi, MockKind::Gemini, MockKind::Claude] {
        let mock = MockProvider::start(kind).await;
        mock.mock_authenticated_success(TEST_API_KEY, "hello from upstream")
            .await;

        let gateway = TestGateway::in_memory(fast_config());
        gateway.add(provider_for(&mock, "upstream", 1)).await;

        let response = gateway
            .router
            .call_with_fallback(TaskType::Default, "hi", &[])
            .await
            .unwrap();
        assert!(response.ok, "{kind:?} failed: {:?}", response.error);
        assert_eq!(response.content, "hello from upstream");
        assert_eq!(response.provider_id, Some(ProviderId(1)));
        assert_eq!(mock.completion_calls().await, 1, "{kind:?}");
    }
}

/// Wrong credentials never match the authenticated mock
#[tokio::test]
async fn test_wrong_key_fails() {
    let mock = MockProvider::openai().await;
    mock.mock_authenticated_success("another-key", "unused").await;

    let gateway = TestGateway::in_memory(fast_config());
    gateway.add(provider_for(&mock, "openai", 1)).await;

    let response = gateway
        .router
        .call_with_fallback(TaskType::Default, "hi", &[])
        .await
        .unwrap();
    assert!(!response.ok);
    assert_eq!(response.error.as_deref(), Some(FallbackResponse::ALL_PROVIDERS_FAILED));

    let entries = gateway.log_entries().await;
    assert_eq!(entries.len(), 2);
    assert!(entries[0]
        .error_message
        .as_deref()
        .unwrap()
        .starts_with("HTTP 404"));
}

/// The OpenAI body carries the task's model, temperature and image parts
#[tokio::test]
async fn test_openai_vision_body() {
    let mock = MockProvider::openai().await;
    mock.mock_success("a bowl of ramen").await;

    let gateway = TestGateway::in_memory(fast_config());
    gateway.add(provider_for(&mock, "openai", 1)).await;

    let images = vec!["https://img.example/ramen.jpg".to_string()];
    let response = gateway
        .router
        .call_with_fallback(TaskType::Vision, "what is this", &images)
        .await
        .unwrap();
    assert!(response.ok);

    let bodies = mock.completion_bodies().await;
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    assert_eq!(body["model"], "gpt-4o");
    assert!(body["temperature"].as_f64().unwrap() > 0.0);
    let parts = body["messages"][0]["content"].as_array().unwrap();
    assert_eq!(parts[0]["type"], "text");
    assert_eq!(parts[0]["text"], "what is this");
    assert_eq!(parts[1]["type"], "image_url");
    assert_eq!(parts[1]["image_url"]["url"], "https://img.example/ramen.jpg");
}

/// Tasks without a model of their own fall back to the default model
#[tokio::test]
async fn test_model_falls_back_to_default() {
    let mock = MockProvider::openai().await;
    mock.mock_success("calm").await;

    let gateway = TestGateway::in_memory(fast_config());
    gateway.add(provider_for(&mock, "openai", 1)).await;

    gateway
        .router
        .call_with_fallback(TaskType::Emotion, "how do I feel", &[])
        .await
        .unwrap();

    let bodies = mock.completion_bodies().await;
    assert_eq!(bodies[0]["model"], "gpt-4o-mini");
    assert_eq!(bodies[0]["messages"][0]["content"], "how do I feel");
}

/// Gemini lists remote image URLs in the prompt text
#[tokio::test]
async fn test_gemini_remote_images_become_hints() {
    let mock = MockProvider::gemini().await;
    mock.mock_success("salad").await;

    let gateway = TestGateway::in_memory(fast_config());
    gateway.add(provider_for(&mock, "gemini", 1)).await;

    let images = vec!["https://img.example/salad.png".to_string()];
    let response = gateway
        .router
        .call_with_fallback(TaskType::Vision, "describe", &images)
        .await
        .unwrap();
    assert!(response.ok);

    let bodies = mock.completion_bodies().await;
    let text = bodies[0]["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("describe"));
    assert!(text.contains("https://img.example/salad.png"));
}

/// Claude has no image input; references go into the prompt
#[tokio::test]
async fn test_claude_vision_degrades_to_text() {
    let mock = MockProvider::claude().await;
    mock.mock_success("looks like pasta").await;

    let gateway = TestGateway::in_memory(fast_config());
    gateway.add(provider_for(&mock, "claude", 1)).await;

    let images = vec!["https://img.example/pasta.jpg".to_string()];
    let response = gateway
        .router
        .call_with_fallback(TaskType::Vision, "describe", &images)
        .await
        .unwrap();
    assert_eq!(response.content, "looks like pasta");

    let bodies = mock.completion_bodies().await;
    let content = bodies[0]["messages"][0]["content"].as_str().unwrap();
    assert!(content.contains("Image URLs:"));
    assert!(content.contains("https://img.example/pasta.jpg"));
    assert!(bodies[0]["max_tokens"].as_u64().unwrap() > 0);
}

/// Upstream error messages reach the call log
#[tokio::test]
async fn test_status_error_message_logged() {
    let mock = MockProvider::claude().await;
    mock.mock_error(529, "Overloaded").await;

    let gateway = TestGateway::in_memory(RouterConfig::builder().max_retries(1).build());
    gateway.add(provider_for(&mock, "claude", 1)).await;

    gateway
        .router
        .call_with_fallback(TaskType::Default, "hi", &[])
        .await
        .unwrap();

    let entries = gateway.log_entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, CallStatus::Failed);
    assert_eq!(entries[0].error_message.as_deref(), Some("HTTP 529: Overloaded"));
}

/// A 2xx body of the wrong shape is a failed attempt
#[tokio::test]
async fn test_unexpected_shape_is_failure() {
    let mock = MockProvider::gemini().await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .respond_with(
            wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})),
        )
        .mount(&mock.server)
        .await;

    let gateway = TestGateway::in_memory(RouterConfig::builder().max_retries(1).build());
    gateway.add(provider_for(&mock, "gemini", 1)).await;

    let response = gateway
        .router
        .call_with_fallback(TaskType::Default, "hi", &[])
        .await
        .unwrap();
    assert!(!response.ok);
    let entries = gateway.log_entries().await;
    assert!(entries[0]
        .error_message
        .as_deref()
        .unwrap()
        .contains("no candidates"));
}

/// Any health check status below 500 counts as reachable
#[tokio::test]
async fn test_health_check_statuses() {
    let reachable = MockProvider::openai().await;
    reachable.mock_health(404).await;
    let down = MockProvider::claude().await;
    down.mock_health(503).await;

    let gateway = TestGateway::in_memory(fast_config());
    let up = gateway.add(provider_for(&reachable, "up", 1)).await;
    let broken = gateway.add(provider_for(&down, "down", 2)).await;

    let ok = gateway.router.health_check(&up).await;
    assert!(ok.ok);
    assert_eq!(ok.detail, gateway_providers::REACHABLE);

    let failed = gateway.router.health_check(&broken).await;
    assert!(!failed.ok);
    assert_eq!(failed.detail, "status=503");

    // Health checks stay out of the call log
    assert!(gateway.log_entries().await.is_empty());
}
