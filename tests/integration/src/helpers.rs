//! Test helper utilities for integration tests

use gateway_core::{CallLogEntry, CallLogStore, CallStatus, NewProviderConfig, ProviderConfig, ProviderStore};
use gateway_providers::{AdapterTimeouts, HttpAdapterFactory};
use gateway_routing::{Router, RouterConfig};
use gateway_store::{InMemoryCallLog, InMemoryProviderStore, SqliteStore};
use gateway_telemetry::GatewayMetrics;
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Initialize tracing for tests (only once)
static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
});

/// Initialize tracing for tests
pub fn init_tracing() {
    Lazy::force(&TRACING);
}

/// Router settings for tests: no backoff, default circuit
pub fn fast_config() -> RouterConfig {
    RouterConfig::builder()
        .max_retries(2)
        .retry_backoff(Duration::ZERO)
        .build()
}

/// Short adapter timeouts so hung mocks fail quickly
pub fn test_timeouts() -> AdapterTimeouts {
    AdapterTimeouts {
        chat: Duration::from_secs(5),
        completion: Duration::from_secs(5),
        health: Duration::from_secs(2),
    }
}

/// Router over real HTTP adapters and a pair of stores
pub struct TestGateway {
    pub router: Arc<Router>,
    pub providers: Arc<dyn ProviderStore>,
    pub log: Arc<dyn CallLogStore>,
}

impl TestGateway {
    /// In-memory stores
    pub fn in_memory(config: RouterConfig) -> Self {
        init_tracing();
        Self::build(
            Arc::new(InMemoryProviderStore::new()),
            Arc::new(InMemoryCallLog::new()),
            config,
        )
    }

    /// One SQLite store backing both tables
    pub fn sqlite(store: SqliteStore, config: RouterConfig) -> Self {
        init_tracing();
        Self::build(Arc::new(store.clone()), Arc::new(store), config)
    }

    fn build(
        providers: Arc<dyn ProviderStore>,
        log: Arc<dyn CallLogStore>,
        config: RouterConfig,
    ) -> Self {
        let factory = HttpAdapterFactory::new(test_timeouts()).expect("http client");
        let router = Router::new(
            Arc::clone(&providers),
            Arc::clone(&log),
            Arc::new(factory),
            config,
        )
        .with_metrics(GatewayMetrics::new().expect("metrics registry"));
        Self {
            router: Arc::new(router),
            providers,
            log,
        }
    }

    /// Register a provider
    pub async fn add(&self, provider: NewProviderConfig) -> ProviderConfig {
        self.router
            .registry()
            .create(provider)
            .await
            .expect("create provider")
    }

    /// Whole call log, oldest first
    pub async fn log_entries(&self) -> Vec<CallLogEntry> {
        let mut entries = self.log.recent(10_000).await.expect("read call log");
        entries.reverse();
        entries
    }

    /// (provider id, status) of every log entry, oldest first
    pub async fn log_statuses(&self) -> Vec<(i64, CallStatus)> {
        self.log_entries()
            .await
            .into_iter()
            .map(|e| (e.provider_id.map_or(0, |id| id.get()), e.status))
            .collect()
    }
}
