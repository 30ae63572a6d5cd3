//! Conversation types shared by every backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message (instructions, persona)
    System,
    /// Message from the user/human
    User,
    /// Message from the AI assistant
    Assistant,
}

impl MessageRole {
    /// Wire identifier used by both backends.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A single message in a conversation.
///
/// The `id` and `timestamp` are local bookkeeping; only `role` and
/// `content` are ever sent on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for this message
    pub id: Uuid,
    /// Role of the message sender
    pub role: MessageRole,
    /// Text content of the message
    pub content: String,
    /// Timestamp when the message was created
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new message with the specified role and content
    pub fn new<S: Into<String>>(role: MessageRole, content: S) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new system message
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a new user message
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create a new assistant message
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// The ordered message history for one analysis-plus-chat interaction.
///
/// A session is append-only and owned by the calling application. The
/// gateway only reads it to build requests; the caller appends the
/// returned answer itself. Message order is request order and is
/// preserved verbatim on every send.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    messages: Vec<Message>,
}

impl Session {
    /// Create a new empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the session
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Convenience method to append a system message
    pub fn add_system_message(&mut self, text: &str) {
        self.push(Message::system(text));
    }

    /// Convenience method to append a user message
    pub fn add_user_message(&mut self, text: &str) {
        self.push(Message::user(text));
    }

    /// Convenience method to append an assistant message
    pub fn add_assistant_message(&mut self, text: &str) {
        self.push(Message::assistant(text));
    }

    /// Get the number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if the session is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Get the last message (most recent)
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Iterate over the messages in order
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Build the `{role, content}` objects both backends expect,
    /// in session order.
    pub fn wire_format(&self) -> Vec<Value> {
        self.messages
            .iter()
            .map(|message| {
                serde_json::json!({
                    "role": message.role.as_str(),
                    "content": message.content,
                })
            })
            .collect()
    }
}

impl From<Vec<Message>> for Session {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

impl<'a> IntoIterator for &'a Session {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
