//! Adapter construction by provider family.

use crate::claude::ClaudeAdapter;
use crate::common::{build_client, AdapterTimeouts};
use crate::gemini::GeminiAdapter;
use crate::openai_compatible::OpenAICompatibleAdapter;
use gateway_core::{
    AdapterFactory, GatewayResult, ModelMap, ProviderAdapter, ProviderConfig, ProviderKind,
};
use reqwest::Client;
use secrecy::SecretString;
use std::sync::Arc;

/// Build an adapter with default timeouts and a fresh HTTP client.
///
/// # Errors
/// Returns an error if the HTTP client cannot be created
pub fn build_adapter(
    kind: ProviderKind,
    base_url: &str,
    api_key: SecretString,
    model_map: ModelMap,
) -> GatewayResult<Arc<dyn ProviderAdapter>> {
    Ok(adapter_for(
        kind,
        base_url,
        api_key,
        model_map,
        build_client()?,
        AdapterTimeouts::default(),
    ))
}

/// [`build_adapter`] for a family given as a string.
///
/// # Errors
/// Returns `UnsupportedProviderType` for an unknown family
pub fn build_adapter_from_str(
    kind: &str,
    base_url: &str,
    api_key: SecretString,
    model_map: ModelMap,
) -> GatewayResult<Arc<dyn ProviderAdapter>> {
    build_adapter(kind.parse()?, base_url, api_key, model_map)
}

fn adapter_for(
    kind: ProviderKind,
    base_url: &str,
    api_key: SecretString,
    model_map: ModelMap,
    client: Client,
    timeouts: AdapterTimeouts,
) -> Arc<dyn ProviderAdapter> {
    match kind {
        ProviderKind::OpenaiCompatible | ProviderKind::NewApi => Arc::new(
            OpenAICompatibleAdapter::new(kind, base_url, api_key, model_map, client, timeouts),
        ),
        ProviderKind::Gemini => {
            Arc::new(GeminiAdapter::new(base_url, api_key, model_map, client, timeouts))
        }
        ProviderKind::Claude => {
            Arc::new(ClaudeAdapter::new(base_url, api_key, model_map, client, timeouts))
        }
    }
}

/// Production [`AdapterFactory`]: real HTTP adapters sharing one client
#[derive(Debug, Clone)]
pub struct HttpAdapterFactory {
    client: Client,
    timeouts: AdapterTimeouts,
}

impl HttpAdapterFactory {
    /// Create a factory
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn new(timeouts: AdapterTimeouts) -> GatewayResult<Self> {
        Ok(Self {
            client: build_client()?,
            timeouts,
        })
    }
}

impl AdapterFactory for HttpAdapterFactory {
    fn build(&self, config: &ProviderConfig) -> GatewayResult<Arc<dyn ProviderAdapter>> {
        Ok(adapter_for(
            config.kind,
            &config.base_url,
            config.api_key.clone(),
            config.model_map.clone(),
            self.client.clone(),
            self.timeouts,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_core::{GatewayError, NewProviderConfig, ProviderId, TaskType};

    fn key() -> SecretString {
        SecretString::new("k".to_string())
    }

    #[test]
    fn test_build_each_family() {
        for kind in ProviderKind::ALL {
            let adapter = build_adapter(kind, "https://x.test", key(), ModelMap::new()).unwrap();
            assert_eq!(adapter.kind(), kind);
        }
    }

    #[test]
    fn test_build_from_str() {
        let adapter = build_adapter_from_str(
            "new_api",
            "https://relay.test/v1",
            key(),
            ModelMap::new().with(TaskType::Recommend, "m"),
        )
        .unwrap();
        assert_eq!(adapter.kind(), ProviderKind::NewApi);
        assert_eq!(adapter.model_for(TaskType::Recommend), "m");

        let err = build_adapter_from_str("mistral", "https://x.test", key(), ModelMap::new())
            .err()
            .unwrap();
        assert_eq!(err, GatewayError::unsupported_provider_type("mistral"));
    }

    #[test]
    fn test_factory_builds_from_config() {
        let factory = HttpAdapterFactory::new(AdapterTimeouts::default()).unwrap();
        let config = NewProviderConfig::new(ProviderKind::Gemini, "g", "https://g.test", "k")
            .with_model_map(ModelMap::new().with(TaskType::Default, "gemini-1.5-flash"))
            .into_config(ProviderId(1), chrono::Utc::now());

        let adapter = factory.build(&config).unwrap();
        assert_eq!(adapter.kind(), ProviderKind::Gemini);
        assert_eq!(adapter.model_for(TaskType::Emotion), "gemini-1.5-flash");
    }
}
