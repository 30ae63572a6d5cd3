//! Multi-provider chat-completion gateway with a unified interface.
//!
//! Two structurally different backends sit behind one trait: OpenRouter
//! (remote, bearer-key auth, SSE streaming) and Ollama (local daemon,
//! no auth, newline-delimited JSON streaming). The gateway discovers
//! which models are usable, verifies reachability and credentials
//! before use, and issues chat requests in blocking or streamed mode,
//! normalizing both wire formats into one lazy fragment sequence.
//!
//! # Quick Start
//!
//! ```no_run
//! use llm_gateway::{provider_for, ChatReply, ProviderConfig, Session};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ProviderConfig::ollama("gemma3:4b");
//!     let provider = provider_for(&config)?;
//!
//!     provider.probe().await?;
//!
//!     let mut session = Session::new();
//!     session.add_system_message("You are a seasoned career coach.");
//!     session.add_user_message("How do I present a career gap?");
//!
//!     match provider.invoke(config.model(), &session, true).await? {
//!         ChatReply::Complete(text) => println!("{text}"),
//!         ChatReply::Streaming(mut fragments) => {
//!             while let Some(fragment) = fragments.next().await {
//!                 print!("{}", fragment?.text);
//!             }
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! caller → provider_for(ProviderConfig) → ChatProvider
//!                                           ├─ OpenRouterProvider → SSE decoder
//!                                           └─ OllamaProvider     → NDJSON decoder
//! ```
//!
//! The caller owns the [`Session`](crate::types::Session) and the
//! selected model id; the gateway is stateless between calls and never
//! mutates the session.

pub mod config;
pub mod providers;
pub mod registry;
pub mod streaming;
pub mod traits;

// Re-export core types for convenience
pub use config::ProviderConfig;
pub use registry::provider_for;
pub use traits::{
    ChatProvider, ChatReply, FragmentStream, ModelDescriptor, ProviderType, StreamFragment,
};
