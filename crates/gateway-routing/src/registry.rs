//! Provider registry.

use gateway_core::{
    AuditLogStore, GatewayResult, NewAuditEntry, NewProviderConfig, ProviderConfig,
    ProviderConfigUpdate, ProviderId, ProviderStore,
};
use std::sync::Arc;
use tracing::info;

/// Read and administer configured providers
#[derive(Clone)]
pub struct ProviderRegistry {
    store: Arc<dyn ProviderStore>,
    audit: Option<Arc<dyn AuditLogStore>>,
    actor: Option<String>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("audited", &self.audit.is_some())
            .field("actor", &self.actor)
            .finish_non_exhaustive()
    }
}

impl ProviderRegistry {
    /// Create a registry over a store
    #[must_use]
    pub fn new(store: Arc<dyn ProviderStore>) -> Self {
        Self {
            store,
            audit: None,
            actor: None,
        }
    }

    /// Append an audit entry for every successful create and update
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditLogStore>, actor: Option<String>) -> Self {
        self.audit = Some(audit);
        self.actor = actor;
        self
    }

    async fn audit(
        &self,
        entry: impl FnOnce(Option<String>) -> NewAuditEntry + Send,
    ) -> GatewayResult<()> {
        if let Some(audit) = &self.audit {
            audit.append_audit(entry(self.actor.clone())).await?;
        }
        Ok(())
    }

    /// Enabled providers, lowest priority value first, id as tie-break.
    ///
    /// Sorted here so the order does not depend on the store.
    pub async fn list_enabled(&self) -> GatewayResult<Vec<ProviderConfig>> {
        let mut providers = self.store.list_enabled().await?;
        providers.retain(|p| p.enabled);
        providers.sort_by_key(|p| (p.priority, p.id));
        Ok(providers)
    }

    /// Every provider, enabled or not, in priority order
    pub async fn list_all(&self) -> GatewayResult<Vec<ProviderConfig>> {
        let mut providers = self.store.list_all().await?;
        providers.sort_by_key(|p| (p.priority, p.id));
        Ok(providers)
    }

    /// Look up one provider
    pub async fn get(&self, id: ProviderId) -> GatewayResult<Option<ProviderConfig>> {
        self.store.get(id).await
    }

    /// Register a provider after validating it
    pub async fn create(&self, new: NewProviderConfig) -> GatewayResult<ProviderConfig> {
        let created = self.store.create(new.validated()?).await?;
        info!(
            provider_id = %created.id,
            name = %created.name,
            kind = %created.kind,
            priority = created.priority,
            "Provider registered"
        );
        self.audit(|actor| NewAuditEntry::provider_created(actor, &created))
            .await?;
        Ok(created)
    }

    /// Apply a partial update
    pub async fn update(
        &self,
        id: ProviderId,
        update: ProviderConfigUpdate,
    ) -> GatewayResult<ProviderConfig> {
        let record = NewAuditEntry::provider_updated(None, id, &update);
        let updated = self.store.update(id, update).await?;
        info!(
            provider_id = %updated.id,
            enabled = updated.enabled,
            priority = updated.priority,
            "Provider updated"
        );
        self.audit(|actor| NewAuditEntry { actor, ..record }).await?;
        Ok(updated)
    }
}
