//! Provider registry: constructs adapters and filters out unconfigured ones

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{EnsembleError, EnsembleResult};
use crate::services::{GeminiProvider, GroqProvider, OpenAiProvider};
use crate::traits::Provider;
use crate::types::{ProviderConfig, ProviderId};

/// Constructor registry over the closed provider set
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Construct the adapter for a known provider
    pub fn create(id: ProviderId, config: ProviderConfig) -> Arc<dyn Provider> {
        match id {
            ProviderId::OpenAi => Arc::new(OpenAiProvider::new(config)),
            ProviderId::Groq => Arc::new(GroqProvider::new(config)),
            ProviderId::Gemini => Arc::new(GeminiProvider::new(config)),
        }
    }

    /// Construct an adapter by name; unknown names fail with the list of
    /// known providers
    pub fn create_by_name(name: &str, config: ProviderConfig) -> EnsembleResult<Arc<dyn Provider>> {
        let id: ProviderId = name.parse().map_err(|_| EnsembleError::UnknownProvider {
            name: name.to_string(),
            available: ProviderId::known_names(),
        })?;
        Ok(Self::create(id, config))
    }

    /// Construct every enabled provider that has a credential
    ///
    /// Providers with a missing or empty api key are skipped with a warning
    /// rather than failing startup, so partial-credential deployments
    /// degrade gracefully.
    pub fn create_active(
        enabled: &[ProviderId],
        configs: &HashMap<ProviderId, ProviderConfig>,
    ) -> HashMap<ProviderId, Arc<dyn Provider>> {
        let mut providers: HashMap<ProviderId, Arc<dyn Provider>> = HashMap::new();

        for &id in enabled {
            let Some(config) = configs.get(&id) else {
                warn!(provider = %id, "no configuration for enabled provider, skipping");
                continue;
            };
            if config.api_key.is_empty() {
                warn!(provider = %id, "api key not set, provider disabled");
                continue;
            }
            providers.insert(id, Self::create(id, config.clone()));
            info!(provider = %id, model = %config.model, "provider initialized");
        }

        providers
    }
}
