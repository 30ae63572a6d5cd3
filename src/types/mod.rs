//! Core type definitions shared across the gateway.

pub mod messages;

pub use messages::{Message, MessageRole, Session};
