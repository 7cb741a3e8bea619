//! Wiring of stores, adapters and the router for one CLI invocation.

use anyhow::{Context as _, Result};
use gateway_config::GatewayConfig;
use gateway_core::{AuditLogStore, CallLogStore, ProviderStore};
use gateway_providers::{AdapterTimeouts, HttpAdapterFactory};
use gateway_recommend::RecommendationService;
use gateway_routing::{Router, RouterConfig};
use gateway_store::{
    InMemoryAuditLog, InMemoryCallLog, InMemoryProviderStore, PoolConfig, SqliteStore,
};
use gateway_telemetry::GatewayMetrics;
use std::sync::Arc;
use tracing::{debug, warn};

/// Everything a command needs
pub struct GatewayContext {
    router: Arc<Router>,
    audit: Arc<dyn AuditLogStore>,
    sqlite: Option<SqliteStore>,
}

impl GatewayContext {
    /// Build stores and the router from configuration.
    ///
    /// With a database URL the SQLite store backs the provider table, the
    /// call log and the audit trail; otherwise they live in memory for this
    /// process. Provider changes are attributed to `actor`.
    pub async fn build(config: &GatewayConfig, actor: Option<String>) -> Result<Self> {
        let (providers, call_log, audit, sqlite): (
            Arc<dyn ProviderStore>,
            Arc<dyn CallLogStore>,
            Arc<dyn AuditLogStore>,
            _,
        ) = match &config.storage.database_url {
                Some(url) => {
                    let pool = PoolConfig::builder()
                        .max_connections(config.storage.max_connections)
                        .connect_timeout(config.storage.connect_timeout)
                        .build();
                    let store = SqliteStore::connect(url, &pool)
                        .await
                        .with_context(|| format!("failed to open {url}"))?;
                    store.migrate().await.context("failed to migrate database")?;
                    (
                        Arc::new(store.clone()),
                        Arc::new(store.clone()),
                        Arc::new(store.clone()),
                        Some(store),
                    )
                }
                None => {
                    warn!("No database configured, providers and call log are not persisted");
                    (
                        Arc::new(InMemoryProviderStore::new()),
                        Arc::new(InMemoryCallLog::new()),
                        Arc::new(InMemoryAuditLog::new()),
                        None,
                    )
                }
            };

        let factory = HttpAdapterFactory::new(AdapterTimeouts::from(&config.adapters))?;
        let metrics = GatewayMetrics::new()?;
        let router = Router::new(
            providers,
            call_log,
            Arc::new(factory),
            RouterConfig::from(&config.routing),
        )
        .with_metrics(metrics)
        .with_audit(Arc::clone(&audit), actor);

        debug!(persistent = sqlite.is_some(), "Gateway context ready");
        Ok(Self {
            router: Arc::new(router),
            audit,
            sqlite,
        })
    }

    /// The fallback router
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Trail of provider changes
    pub fn audit_log(&self) -> &dyn AuditLogStore {
        self.audit.as_ref()
    }

    /// Recommendation service sharing this context's router
    pub fn recommendations(&self) -> RecommendationService {
        RecommendationService::new(Arc::clone(&self.router))
    }

    /// Release the database pool, if any.
    pub async fn close(&self) {
        if let Some(store) = &self.sqlite {
            store.close().await;
        }
    }
}
