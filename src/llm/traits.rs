//! Core traits for the chat-completion gateway.
//!
//! [`ChatProvider`] is the single seam between callers and the two
//! backend protocols. Providers own all wire-format details: request
//! shaping, response parsing, streaming decode, and error
//! classification. Everything downstream of
//! [`provider_for`](crate::llm::registry::provider_for) depends only on
//! this trait.

use crate::error::GatewayError;
use crate::types::Session;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

/// Which backend a provider talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderType {
    /// OpenRouter's hosted, API-key-authenticated service
    OpenRouter,
    /// A locally running Ollama daemon
    Ollama,
}

impl ProviderType {
    /// Get string representation of provider type
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::OpenRouter => "openrouter",
            ProviderType::Ollama => "ollama",
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One model a backend currently exposes as usable.
///
/// `id` is the opaque wire identifier and must be passed back verbatim
/// in chat requests; the gateway never synthesizes ids, it only copies
/// them from catalog data. `display_name` is for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub display_name: String,
}

/// One incremental unit of an in-progress answer.
///
/// Concatenating the fragments of a stream in yield order reproduces
/// the complete answer text exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFragment {
    pub text: String,
}

/// A lazy, single-pass, finite sequence of answer fragments.
///
/// `Err` items are either a non-fatal [`GatewayError::DecodeError`]
/// (the stream continues) or a terminal
/// [`GatewayError::StreamAborted`]. Dropping the stream releases the
/// underlying HTTP connection.
pub type FragmentStream =
    Box<dyn Stream<Item = Result<StreamFragment, GatewayError>> + Send + Unpin>;

/// Reply from [`ChatProvider::invoke`]: either the whole answer or a
/// lazy fragment stream.
pub enum ChatReply {
    Complete(String),
    Streaming(FragmentStream),
}

impl std::fmt::Debug for ChatReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatReply::Complete(text) => f.debug_tuple("Complete").field(text).finish(),
            ChatReply::Streaming(_) => f.debug_tuple("Streaming").field(&"..").finish(),
        }
    }
}

/// A chat-completion backend.
///
/// Implementations are stateless between calls; the caller owns the
/// [`Session`] and the selected model id, and passes both into every
/// call.
#[async_trait]
pub trait ChatProvider: Send + Sync + std::fmt::Debug {
    /// Verify the backend is reachable and credentials are accepted.
    async fn probe(&self) -> Result<(), GatewayError>;

    /// List the models currently usable through this backend, in
    /// backend-supplied order.
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, GatewayError>;

    /// Blocking chat: send the whole session, get the whole answer.
    ///
    /// The returned text equals the backend's content field exactly,
    /// with no trimming or mutation.
    async fn chat(&self, model_id: &str, session: &Session) -> Result<String, GatewayError>;

    /// Streaming chat: send the whole session, get a lazy fragment
    /// stream. A failure detected before any stream content arrives is
    /// returned as an error instead of a stream.
    async fn chat_streaming(
        &self,
        model_id: &str,
        session: &Session,
    ) -> Result<FragmentStream, GatewayError>;

    /// Issue a chat request in either mode.
    async fn invoke(
        &self,
        model_id: &str,
        session: &Session,
        streaming: bool,
    ) -> Result<ChatReply, GatewayError> {
        if streaming {
            Ok(ChatReply::Streaming(
                self.chat_streaming(model_id, session).await?,
            ))
        } else {
            Ok(ChatReply::Complete(self.chat(model_id, session).await?))
        }
    }

    /// Get provider type
    fn provider_type(&self) -> ProviderType;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_type_display() {
        assert_eq!(ProviderType::OpenRouter.to_string(), "openrouter");
        assert_eq!(ProviderType::Ollama.to_string(), "ollama");
    }

    #[test]
    fn chat_reply_debug_does_not_require_stream_debug() {
        let reply = ChatReply::Complete("hi".to_string());
        assert!(format!("{:?}", reply).contains("hi"));
    }
}
