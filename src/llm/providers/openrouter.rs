//! OpenRouter provider implementation.
//!
//! This provider connects to OpenRouter's hosted API: bearer-key
//! authentication, an OpenAI-style chat-completions endpoint, and SSE
//! streaming. The model catalog is filtered to the free tier, since
//! that is what the surrounding application offers.

use crate::error::{classify_http_failure, classify_transport, error_details, GatewayError};
use crate::llm::config::{OPENROUTER_BASE_URL, REQUEST_TIMEOUT};
use crate::llm::providers::{http_client, normalize_base_url};
use crate::llm::streaming::decode_sse;
use crate::llm::traits::{ChatProvider, FragmentStream, ModelDescriptor, ProviderType};
use crate::types::Session;
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;

/// OpenRouter provider
#[derive(Debug)]
pub struct OpenRouterProvider {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenRouterProvider {
    /// Create a new OpenRouter provider.
    ///
    /// `base_url` defaults to the hosted endpoint when `None`.
    pub fn new(api_key: String, base_url: Option<String>) -> Result<Self, GatewayError> {
        let base_url =
            normalize_base_url(base_url.as_deref().unwrap_or(OPENROUTER_BASE_URL))?;
        let client = http_client()?;

        Ok(Self {
            api_key,
            base_url,
            client,
        })
    }

    fn chat_request(&self, model_id: &str, session: &Session, stream: bool) -> Value {
        serde_json::json!({
            "model": model_id,
            "messages": session.wire_format(),
            "stream": stream,
        })
    }
}

#[async_trait]
impl ChatProvider for OpenRouterProvider {
    /// Credential check against the read-only credits endpoint.
    ///
    /// An `error` field in the body means the key is invalid or
    /// expired, whatever the HTTP status was.
    async fn probe(&self) -> Result<(), GatewayError> {
        let url = format!("{}/credits", self.base_url);
        tracing::debug!("checking OpenRouter credential against {url}");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|err| classify_transport(&err))?;

        let body: Value = response
            .json()
            .await
            .map_err(|err| GatewayError::MalformedResponse {
                message: format!("credits response was not JSON: {err}"),
            })?;

        if let Some(error) = body.get("error") {
            let (code, message) = error_details(error);
            tracing::warn!("OpenRouter rejected credential: {message}");
            return Err(GatewayError::Unauthorized { code, message });
        }

        Ok(())
    }

    /// Fetch the model directory and keep only free-tier entries.
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, GatewayError> {
        let url = format!("{}/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|err| classify_transport(&err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_failure(status, &body));
        }

        let directory: Value =
            response
                .json()
                .await
                .map_err(|err| GatewayError::MalformedResponse {
                    message: format!("model directory was not JSON: {err}"),
                })?;

        let models = free_models(&directory);
        tracing::debug!("OpenRouter catalog: {} free models", models.len());
        Ok(models)
    }

    async fn chat(&self, model_id: &str, session: &Session) -> Result<String, GatewayError> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(model = model_id, "OpenRouter chat request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&self.chat_request(model_id, session, false))
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
        completion_text(&envelope)
    }

    async fn chat_streaming(
        &self,
        model_id: &str,
        session: &Session,
    ) -> Result<FragmentStream, GatewayError> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(model = model_id, "OpenRouter streaming chat request");

        // No overall deadline here: the stream may legitimately run for
        // minutes. Only the connect phase is bounded.
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Accept", "text/event-stream")
            .json(&self.chat_request(model_id, session, true))
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
        Ok(decode_sse(bytes))
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::OpenRouter
    }
}

/// Filter the model directory down to free-tier entries.
///
/// A model qualifies iff both its prompt and completion prices parse
/// to exactly zero; an entry with an unparsable price is excluded, not
/// an error. Directory order is preserved.
fn free_models(directory: &Value) -> Vec<ModelDescriptor> {
    let Some(entries) = directory.get("data").and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let id = entry.get("id")?.as_str()?;
            let name = entry.get("name")?.as_str()?;
            let pricing = entry.get("pricing")?;
            if price(pricing, "prompt")? != 0.0 || price(pricing, "completion")? != 0.0 {
                return None;
            }
            Some(ModelDescriptor {
                id: id.to_string(),
                display_name: name.to_string(),
            })
        })
        .collect()
}

fn price(pricing: &Value, field: &str) -> Option<f64> {
    match pricing.get(field)? {
        Value::String(text) => text.trim().parse().ok(),
        Value::Number(number) => number.as_f64(),
        _ => None,
    }
}

/// Extract the single completion from a non-streaming response
/// envelope, verbatim.
fn completion_text(envelope: &Value) -> Result<String, GatewayError> {
    envelope
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| GatewayError::MalformedResponse {
            message: "chat response missing choices[0].message.content".to_string(),
        })
}
