//! End-to-end integration tests
//!
//! From configuration file to recommendation: seeded providers, real
//! adapters, structured parsing and the rule fallback.

use crate::fixtures::*;
use crate::helpers::*;
use crate::mock_providers::*;
use gateway_config::{ConfigFormat, GatewayConfig};
use gateway_core::{FallbackResponse, ProviderId, TaskType};
use gateway_recommend::{GenerationMode, RecommendationService};
use gateway_routing::RouterConfig;
use pretty_assertions::assert_eq;
use std::sync::Arc;

/// E2E test: model answer in a markdown fence becomes the recommendation
#[tokio::test]
async fn test_e2e_recommendation_from_model() {
    let mock = MockProvider::claude().await;
    mock.mock_success(&recommendation_answer()).await;

    let gateway = TestGateway::in_memory(fast_config());
    gateway.add(provider_for(&mock, "claude", 1)).await;
    let service = RecommendationService::new(Arc::clone(&gateway.router));

    let outcome = service.recommend(&stressed_heavy_meal()).await;
    assert_eq!(outcome.generation_mode, GenerationMode::Llm);
    assert_eq!(outcome.recommendation.goal, "fat_loss");
    assert_eq!(
        outcome.recommendation.meal_suggestion,
        "Swap the fries for a side salad"
    );
    assert_eq!(
        outcome.recommendation.risk_alert.as_deref(),
        Some("Signs of stress eating")
    );
    assert_eq!(outcome.provider_id, Some(ProviderId(1)));

    // The prompt carried the scorer outputs
    let bodies = mock.completion_bodies().await;
    let prompt = bodies[0]["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains("\"label\":\"stressed\""));
    assert!(prompt.contains("goal=fat_loss"));

    let entries = gateway.log_entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].task, TaskType::Recommend);
}

/// E2E test: an answer that is not a recommendation falls back to rules
#[tokio::test]
async fn test_e2e_unusable_answer_falls_back() {
    let mock = MockProvider::openai().await;
    mock.mock_success("I think you should eat more vegetables.").await;

    let gateway = TestGateway::in_memory(fast_config());
    gateway.add(provider_for(&mock, "openai", 1)).await;
    let service = RecommendationService::new(Arc::clone(&gateway.router));

    let outcome = service.recommend(&stressed_heavy_meal()).await;
    assert!(outcome.is_fallback());
    assert_eq!(
        outcome.fallback_reason.as_deref(),
        Some("No JSON object found in model output")
    );
    assert!(outcome.recommendation.meal_suggestion.contains("high in calories"));
    assert!(outcome.recommendation.behavior_suggestion.contains("breathing"));
    // The provider did answer, so the log records a success
    assert_eq!(gateway.log_entries().await[0].status, gateway_core::CallStatus::Ok);
}

/// E2E test: every provider down still yields a recommendation
#[tokio::test]
async fn test_e2e_all_down_falls_back() {
    let openai = MockProvider::openai().await;
    openai.mock_error(503, "down").await;
    let gemini = MockProvider::gemini().await;
    gemini.mock_error(503, "down").await;

    let gateway = TestGateway::in_memory(RouterConfig::builder().max_retries(1).build());
    gateway.add(provider_for(&openai, "openai", 1)).await;
    gateway.add(provider_for(&gemini, "gemini", 2)).await;
    let service = RecommendationService::new(Arc::clone(&gateway.router));

    let outcome = service.recommend(&stressed_heavy_meal()).await;
    assert!(outcome.is_fallback());
    assert_eq!(
        outcome.fallback_reason.as_deref(),
        Some(FallbackResponse::ALL_PROVIDERS_FAILED)
    );
    assert_eq!(outcome.recommendation.goal, "fat_loss");

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["generation_mode"], "fallback_rule");
    assert!(json.get("provider_id").is_none());
}

/// E2E test: providers seeded from a YAML file route in configured order
#[tokio::test]
async fn test_e2e_seeded_from_config() {
    let gemini = MockProvider::gemini().await;
    gemini.mock_authenticated_success("gemini-secret", "seeded gemini").await;
    let claude = MockProvider::claude().await;
    claude.mock_success("seeded claude").await;

    let yaml = format!(
        r#"
routing:
  max_retries: 1
  retry_backoff: 0s
  circuit_failure_threshold: 3
  circuit_window: 5m
providers:
  - provider_type: claude
    name: backup
    base_url: {claude_url}
    api_key: inline-key
    priority: 20
  - provider_type: gemini
    name: primary
    base_url: {gemini_url}
    api_key_env: TEST_GEMINI_KEY
    priority: 10
    model_map:
      default: {GEMINI_MODEL}
"#,
        claude_url = claude.base_url(),
        gemini_url = gemini.base_url(),
    );
    let config = GatewayConfig::parse(&yaml, ConfigFormat::Yaml).unwrap();
    config.validate().unwrap();

    let gateway = TestGateway::in_memory(RouterConfig::from(&config.routing));
    let lookup = |key: &str| (key == "TEST_GEMINI_KEY").then(|| "gemini-secret".to_string());
    for seed in &config.providers {
        gateway.add(seed.to_new_provider(lookup).unwrap()).await;
    }

    let response = gateway
        .router
        .call_with_fallback(TaskType::Default, "hi", &[])
        .await
        .unwrap();
    assert_eq!(response.content, "seeded gemini");
    assert_eq!(claude.completion_calls().await, 0);

    let names: Vec<String> = gateway
        .router
        .registry()
        .list_enabled()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["primary", "backup"]);
}
