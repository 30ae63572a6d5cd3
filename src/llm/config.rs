//! Per-session backend configuration.
//!
//! A [`ProviderConfig`] describes how to reach one backend and which
//! model to use. It is immutable once constructed and is recreated
//! whenever the user switches backend or model; the gateway itself
//! keeps no configuration state.

use crate::llm::traits::ProviderType;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default base URL for OpenRouter's hosted API.
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default base URL for a local Ollama daemon.
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/";

/// Connect-phase deadline applied to every request, streaming included.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall deadline for non-streaming requests. Streaming reads are
/// deliberately unbounded past the connect phase so long generations
/// are not cut off.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for one backend, for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProviderConfig {
    /// OpenRouter configuration
    OpenRouter {
        #[serde(skip)] // Don't serialize the credential
        api_key: String,
        /// Override for [`OPENROUTER_BASE_URL`]
        base_url: Option<String>,
        /// Wire id of the selected model, copied from catalog data
        model: String,
    },
    /// Ollama configuration
    Ollama {
        base_url: String,
        /// Tag of the selected locally-pulled model
        model: String,
    },
}

impl ProviderConfig {
    /// Configuration for OpenRouter at the default endpoint.
    pub fn openrouter<K: Into<String>, M: Into<String>>(api_key: K, model: M) -> Self {
        ProviderConfig::OpenRouter {
            api_key: api_key.into(),
            base_url: None,
            model: model.into(),
        }
    }

    /// Configuration for an Ollama daemon at the default local port.
    pub fn ollama<M: Into<String>>(model: M) -> Self {
        ProviderConfig::Ollama {
            base_url: OLLAMA_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    /// Which backend this configuration targets.
    pub fn provider_type(&self) -> ProviderType {
        match self {
            ProviderConfig::OpenRouter { .. } => ProviderType::OpenRouter,
            ProviderConfig::Ollama { .. } => ProviderType::Ollama,
        }
    }

    /// The selected model's wire identifier.
    pub fn model(&self) -> &str {
        match self {
            ProviderConfig::OpenRouter { model, .. } => model,
            ProviderConfig::Ollama { model, .. } => model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_pick_defaults() {
        let remote = ProviderConfig::openrouter("sk-or-123", "meta-llama/llama-3-8b:free");
        assert_eq!(remote.provider_type(), ProviderType::OpenRouter);
        assert_eq!(remote.model(), "meta-llama/llama-3-8b:free");

        let local = ProviderConfig::ollama("gemma3:4b");
        assert_eq!(local.provider_type(), ProviderType::Ollama);
        match local {
            ProviderConfig::Ollama { base_url, .. } => assert_eq!(base_url, OLLAMA_BASE_URL),
            _ => unreachable!(),
        }
    }

    #[test]
    fn api_key_is_never_serialized() {
        let config = ProviderConfig::openrouter("sk-or-secret", "m");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-or-secret"));
    }
}
