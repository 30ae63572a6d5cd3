//! Provider implementations.
//!
//! Each provider implements the [`ChatProvider`](crate::llm::traits::ChatProvider)
//! trait and owns all wire-format logic for its backend.

pub mod ollama;
pub mod openrouter;

// Re-export all providers
pub use ollama::OllamaProvider;
pub use openrouter::OpenRouterProvider;

use crate::error::GatewayError;
use crate::llm::config::CONNECT_TIMEOUT;
use url::Url;

/// Build the HTTP client shared by a provider's requests.
///
/// Only the connect phase is bounded here; non-streaming calls add
/// their own overall deadline per request.
pub(crate) fn http_client() -> Result<reqwest::Client, GatewayError> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|err| GatewayError::Configuration {
            message: format!("failed to build HTTP client: {err}"),
        })
}

/// Validate a base URL and strip any trailing slash so endpoint paths
/// can be appended directly.
pub(crate) fn normalize_base_url(raw: &str) -> Result<String, GatewayError> {
    let url = Url::parse(raw).map_err(|err| GatewayError::Configuration {
        message: format!("invalid base URL '{raw}': {err}"),
    })?;
    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn normalize_strips_trailing_slash() {
        assert_eq!(
            normalize_base_url("http://localhost:11434/").unwrap(),
            "http://localhost:11434"
        );
        assert_eq!(
            normalize_base_url("https://openrouter.ai/api/v1").unwrap(),
            "https://openrouter.ai/api/v1"
        );
    }

    #[test]
    fn normalize_rejects_garbage() {
        let err = normalize_base_url("not a url").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
