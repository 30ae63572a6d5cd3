//! Ollama provider implementation.
//!
//! This provider connects to a locally running Ollama daemon. No
//! authentication; the model list is whatever has been pulled locally,
//! and streaming is newline-delimited JSON rather than SSE.

use crate::error::{classify_http_failure, classify_transport, error_details, GatewayError};
use crate::llm::config::REQUEST_TIMEOUT;
use crate::llm::providers::{http_client, normalize_base_url};
use crate::llm::streaming::decode_ndjson;
use crate::llm::traits::{ChatProvider, FragmentStream, ModelDescriptor, ProviderType};
use crate::types::Session;
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;

/// Ollama provider
#[derive(Debug)]
pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a new Ollama provider for the daemon at `base_url`.
    pub fn new(base_url: String) -> Result<Self, GatewayError> {
        let base_url = normalize_base_url(&base_url)?;
        let client = http_client()?;

        Ok(Self { base_url, client })
    }

    async fn fetch_tags(&self) -> Result<Value, GatewayError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = match self.client.get(&url).timeout(REQUEST_TIMEOUT).send().await {
            Ok(response) => response,
            Err(err) if err.is_connect() => {
                // Daemon not running is the common case; give the
                // caller something actionable.
                return Err(GatewayError::Unreachable {
                    message: format!(
                        "cannot reach Ollama at {}: {err}. Start the server with `ollama serve`",
                        self.base_url
                    ),
                });
            }
            Err(err) => return Err(classify_transport(&err)),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_failure(status, &body));
        }

        response
            .json()
            .await
            .map_err(|err| GatewayError::MalformedResponse {
                message: format!("tags response was not JSON: {err}"),
            })
    }
}

#[async_trait]
impl ChatProvider for OllamaProvider {
    /// Reachability check against the lightweight tags endpoint.
    ///
    /// A connection failure (daemon not started) and an `error` field
    /// in the body are reported as distinct kinds.
    async fn probe(&self) -> Result<(), GatewayError> {
        tracing::debug!("probing Ollama at {}", self.base_url);
        let body = self.fetch_tags().await?;

        if let Some(error) = body.get("error") {
            let (code, message) = error_details(error);
            return Err(GatewayError::ProviderRejected { code, message });
        }

        Ok(())
    }

    /// Every locally pulled model is eligible; no filtering.
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, GatewayError> {
        let listing = self.fetch_tags().await?;

        if let Some(error) = listing.get("error") {
            let (code, message) = error_details(error);
            return Err(GatewayError::ProviderRejected { code, message });
        }

        let models = installed_models(&listing);
        tracing::debug!("Ollama catalog: {} installed models", models.len());
        Ok(models)
    }

    async fn chat(&self, model_id: &str, session: &Session) -> Result<String, GatewayError> {
        let url = format!("{}/api/chat", self.base_url);
        tracing::debug!(model = model_id, "Ollama chat request");

        let request_body = serde_json::json!({
            "model": model_id,
            "messages": session.wire_format(),
            "stream": false,
        });

        let response = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&request_body)
            .send()
            .await
            .map_err(|err| classify_transport(&err))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| classify_transport(&err))?;

        if !status.is_success() {
            return Err(classify_http_failure(status, &body));
        }

        let envelope: Value =
            serde_json::from_str(&body).map_err(|err| GatewayError::MalformedResponse {
                message: format!("chat response was not JSON: {err}"),
            })?;
        message_content(&envelope)
    }

    async fn chat_streaming(
        &self,
        model_id: &str,
        session: &Session,
    ) -> Result<FragmentStream, GatewayError> {
        let url = format!("{}/api/chat", self.base_url);
        tracing::debug!(model = model_id, "Ollama streaming chat request");

        let request_body = serde_json::json!({
            "model": model_id,
            "messages": session.wire_format(),
            "stream": true,
        });

        // Streaming reads get no overall deadline, only the client's
        // connect timeout.
        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|err| classify_transport(&err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_failure(status, &body));
        }

        let bytes = response.bytes_stream().map(|chunk| {
            chunk.map_err(|err| GatewayError::StreamAborted {
                message: err.to_string(),
            })
        });
        Ok(decode_ndjson(bytes))
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::Ollama
    }
}

/// Read the installed-model tags out of an `/api/tags` listing,
/// in listing order.
fn installed_models(listing: &Value) -> Vec<ModelDescriptor> {
    listing
        .get("models")
        .and_then(Value::as_array)
        .map(|models| {
            models
                .iter()
                .filter_map(|entry| entry.get("model").and_then(Value::as_str))
                .map(|tag| ModelDescriptor {
                    id: tag.to_string(),
                    display_name: tag.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Extract the answer from a non-streaming chat envelope, verbatim.
fn message_content(envelope: &Value) -> Result<String, GatewayError> {
    envelope
        .get("message")
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| GatewayError::MalformedResponse {
            message: "chat response missing message.content".to_string(),
        })
}
