//! Chat-completion gateway for resume-analysis applications.
//!
//! This crate is the model-access core of a resume critique tool: the
//! surrounding application handles document extraction, rendering, and
//! PDF export, and calls in here for everything involving a language
//! model. Two backends are supported behind one interface — the
//! OpenRouter hosted API and a local Ollama daemon — covering model
//! discovery, connection/credential checks, and chat completion in
//! blocking or streamed form.
//!
//! See [`llm`] for the gateway itself and [`types`] for the
//! conversation types callers own.
//!
//! # Error Handling
//!
//! No call in this crate panics on a network or protocol failure.
//! Every failure is classified into a [`GatewayError`] whose
//! [`kind`](GatewayError::kind) is specific enough to drive user
//! messaging: a daemon that is not running, an invalid credential, and
//! an overloaded server all come back as different kinds.

pub mod error;
pub mod llm;
pub mod types;

// Re-export the public surface at the crate root
pub use error::{ErrorKind, GatewayError};
pub use llm::config::ProviderConfig;
pub use llm::registry::provider_for;
pub use llm::traits::{
    ChatProvider, ChatReply, FragmentStream, ModelDescriptor, ProviderType, StreamFragment,
};
pub use types::{Message, MessageRole, Session};
