pub mod fallback;
pub mod live;
pub mod simulated;
pub mod util;

use crate::core::config::{AppConfig, ProviderConfig};
use crate::core::provider::RateProvider;
use anyhow::Result;
use fallback::FallbackProvider;
use live::LiveProvider;
use simulated::SimulatedProvider;
use std::sync::Arc;

/// Selects the upstream rate source named in the config.
pub fn build_provider(config: &AppConfig) -> Result<Arc<dyn RateProvider>> {
    let provider: Arc<dyn RateProvider> = match &config.provider {
        ProviderConfig::Live { base_url, api_key } => {
            Arc::new(LiveProvider::new(base_url, api_key.clone(), &config.currency)?)
        }
        ProviderConfig::Simulated { seed: Some(seed) } => Arc::new(SimulatedProvider::with_seed(*seed)),
        ProviderConfig::Simulated { seed: None } => Arc::new(SimulatedProvider::new()),
        ProviderConfig::Fallback => Arc::new(FallbackProvider),
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_provider_by_kind() {
        let mut config = AppConfig::default();
        assert_eq!(build_provider(&config).unwrap().name(), "simulated");

        config.provider = ProviderConfig::Fallback;
        assert_eq!(build_provider(&config).unwrap().name(), "fallback");

        config.provider = ProviderConfig::Live {
            base_url: "http://localhost:1".to_string(),
            api_key: None,
        };
        assert_eq!(build_provider(&config).unwrap().name(), "live");
    }
}
