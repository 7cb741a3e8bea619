//! SQLite-backed routing tests
//!
//! The same router wired over a SQLite file: provider rows, the call log,
//! circuit state and the audit trail all survive a restart.

use crate::fixtures::*;
use crate::helpers::*;
use crate::mock_providers::*;
use gateway_core::{
    AuditAction, AuditLogStore, CallStatus, GatewayError, ProviderConfigUpdate, TaskType,
};
use gateway_routing::{ProviderRegistry, RouterConfig};
use gateway_store::{PoolConfig, SqliteStore};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

async fn open(url: &str) -> SqliteStore {
    let store = SqliteStore::connect(url, &PoolConfig::default())
        .await
        .unwrap();
    store.migrate().await.unwrap();
    store
}

fn breaker_config() -> RouterConfig {
    RouterConfig::builder()
        .max_retries(2)
        .retry_backoff(Duration::ZERO)
        .circuit_failure_threshold(2)
        .build()
}

/// Fallback over the SQLite store logs the same entries as in memory
#[tokio::test]
async fn test_fallback_logged_in_sqlite() {
    let failing = MockProvider::gemini().await;
    failing.mock_error(500, "boom").await;
    let healthy = MockProvider::openai().await;
    healthy.mock_success("from sqlite chain").await;

    let gateway = TestGateway::sqlite(SqliteStore::in_memory().await.unwrap(), fast_config());
    gateway.add(provider_for(&failing, "gemini", 1)).await;
    gateway.add(provider_for(&healthy, "openai", 2)).await;

    let response = gateway
        .router
        .call_with_fallback(TaskType::Emotion, "hi", &[])
        .await
        .unwrap();
    assert_eq!(response.content, "from sqlite chain");

    let entries = gateway.log_entries().await;
    assert_eq!(
        entries.iter().map(|e| e.status).collect::<Vec<_>>(),
        vec![CallStatus::Failed, CallStatus::Failed, CallStatus::Ok]
    );
    assert!(entries.iter().all(|e| e.task == TaskType::Emotion));
    assert_eq!(entries[0].error_message.as_deref(), Some("HTTP 500: boom"));
    assert_eq!(entries[2].attempt, 1);
}

/// Provider names are unique across the table
#[tokio::test]
async fn test_duplicate_provider_name_rejected() {
    let mock = MockProvider::openai().await;
    let gateway = TestGateway::sqlite(SqliteStore::in_memory().await.unwrap(), fast_config());
    gateway.add(provider_for(&mock, "dup", 1)).await;

    let err = gateway
        .router
        .registry()
        .create(provider_for(&mock, "dup", 2))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::DuplicateProviderName { ref name } if name == "dup"));
}

/// An open circuit is still open for a router started later
#[tokio::test]
async fn test_circuit_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("gateway.db").display());

    let failing = MockProvider::claude().await;
    failing.mock_error(503, "down").await;
    let healthy = MockProvider::openai().await;
    healthy.mock_success("healthy").await;

    {
        let store = open(&url).await;
        let gateway = TestGateway::sqlite(store.clone(), breaker_config());
        gateway.add(provider_for(&failing, "claude", 1)).await;
        gateway.add(provider_for(&healthy, "openai", 2)).await;
        gateway
            .router
            .call_with_fallback(TaskType::Recommend, "hi", &[])
            .await
            .unwrap();
        store.close().await;
    }
    assert_eq!(failing.completion_calls().await, 2);

    let store = open(&url).await;
    let gateway = TestGateway::sqlite(store.clone(), breaker_config());
    let providers = gateway.router.registry().list_enabled().await.unwrap();
    assert_eq!(providers.len(), 2);
    assert_eq!(providers[0].name, "claude");

    let response = gateway
        .router
        .call_with_fallback(TaskType::Recommend, "hi", &[])
        .await
        .unwrap();
    assert_eq!(response.content, "healthy");
    assert_eq!(failing.completion_calls().await, 2);

    let last_two: Vec<_> = gateway
        .log_statuses()
        .await
        .into_iter()
        .rev()
        .take(2)
        .collect();
    assert_eq!(
        last_two,
        vec![(2, CallStatus::Ok), (1, CallStatus::SkippedCircuitOpen)]
    );
    store.close().await;
}

/// Provider changes land in the audit trail and outlive the process
#[tokio::test]
async fn test_provider_changes_audited_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("gateway.db").display());
    let mock = MockProvider::gemini().await;

    {
        let store = open(&url).await;
        let registry = ProviderRegistry::new(Arc::new(store.clone()))
            .with_audit(Arc::new(store.clone()), Some("ops".to_string()));
        let created = registry.create(provider_for(&mock, "gemini", 1)).await.unwrap();
        registry
            .update(
                created.id,
                ProviderConfigUpdate {
                    enabled: Some(false),
                    priority: Some(9),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        registry
            .create(provider_for(&mock, "gemini", 2))
            .await
            .unwrap_err();
        store.close().await;
    }

    let store = open(&url).await;
    let trail = store.recent_audit(50).await.unwrap();
    assert_eq!(
        trail.iter().map(|e| e.action).collect::<Vec<_>>(),
        vec![AuditAction::UpdateProvider, AuditAction::CreateProvider]
    );
    assert_eq!(
        trail[0].details["fields"],
        serde_json::json!(["priority", "enabled"])
    );
    assert_eq!(trail[1].details["name"], "gemini");
    assert!(trail.iter().all(|e| e.actor.as_deref() == Some("ops")));
    assert!(!trail
        .iter()
        .any(|e| e.details.to_string().contains(TEST_API_KEY)));
    store.close().await;
}
