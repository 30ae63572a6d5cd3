//! Provider construction from per-session configuration.
//!
//! The backend branch happens exactly once, here; everything downstream
//! works through [`ChatProvider`].

use crate::error::GatewayError;
use crate::llm::config::ProviderConfig;
use crate::llm::providers::{OllamaProvider, OpenRouterProvider};
use crate::llm::traits::ChatProvider;
use std::sync::Arc;

/// Build the provider a configuration describes.
///
/// Called whenever the user switches backend; the returned provider is
/// reused for every call in that session and discarded with it.
pub fn provider_for(config: &ProviderConfig) -> Result<Arc<dyn ChatProvider>, GatewayError> {
    match config {
        ProviderConfig::OpenRouter {
            api_key, base_url, ..
        } => Ok(Arc::new(OpenRouterProvider::new(
            api_key.clone(),
            base_url.clone(),
        )?)),
        ProviderConfig::Ollama { base_url, .. } => {
            Ok(Arc::new(OllamaProvider::new(base_url.clone())?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::llm::traits::ProviderType;

    #[test]
    fn selects_the_matching_provider() {
        let remote = provider_for(&ProviderConfig::openrouter("key", "m")).unwrap();
        assert_eq!(remote.provider_type(), ProviderType::OpenRouter);

        let local = provider_for(&ProviderConfig::ollama("gemma3:4b")).unwrap();
        assert_eq!(local.provider_type(), ProviderType::Ollama);
    }

    #[test]
    fn invalid_base_url_is_a_configuration_error() {
        let config = ProviderConfig::Ollama {
            base_url: "definitely not a url".to_string(),
            model: "m".to_string(),
        };
        let err = provider_for(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
