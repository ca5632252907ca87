use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tools::ToolCall;
use crate::error::ChatError;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
    Tool,
}

/// Reasoning trace streamed alongside an assistant reply
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Reasoning {
    /// Accumulated thinking text
    pub content: String,
    /// How long the reasoning phase lasted, in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

/// Failure recorded on an assistant message for display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageError {
    /// Short machine-readable code, e.g. `E_NET_HTTP`
    pub code: String,
    /// User-facing description
    pub message: String,
    /// Whether retrying the turn may help
    #[serde(default)]
    pub retryable: bool,
    /// What the user can do about it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl From<&ChatError> for MessageError {
    fn from(err: &ChatError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.user_message(),
            retryable: err.is_retryable(),
            hint: Some(err.recovery_hint().to_string()),
        }
    }
}

/// A single item in the chat transcript.
///
/// `parent_id` links each message to the one it answers, forming a
/// singly-linked ancestry chain within a thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Client-generated identifier
    pub id: String,
    /// Role of the message sender
    pub role: MessageRole,
    /// Text content; `Some("")` for an assistant stub awaiting its stream
    pub content: Option<String>,
    /// When the message was created (reset on retry)
    pub created_at: DateTime<Utc>,
    /// Message this one replies to
    pub parent_id: Option<String>,
    /// Thread the message belongs to
    pub thread_id: Option<String>,
    /// Reasoning trace, if the backend streamed one
    #[serde(default)]
    pub reasoning: Option<Reasoning>,
    /// Tool calls made by the assistant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Failure of the turn that produced this message
    #[serde(default)]
    pub error: Option<MessageError>,
    /// Extra structured parts submitted with a user message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<serde_json::Value>>,
}

impl ChatMessage {
    /// Create a message with a fresh id and timestamp.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: Some(content.into()),
            created_at: Utc::now(),
            parent_id: None,
            thread_id: None,
            reasoning: None,
            tool_calls: None,
            error: None,
            parts: None,
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create the empty assistant message that a stream will fill in.
    pub fn assistant_stub(parent_id: &str) -> Self {
        Self::new(MessageRole::Assistant, "").with_parent(parent_id)
    }

    /// Set the parent message.
    pub fn with_parent(mut self, parent_id: &str) -> Self {
        self.parent_id = Some(parent_id.to_string());
        self
    }

    /// Set the thread.
    pub fn with_thread(mut self, thread_id: Option<String>) -> Self {
        self.thread_id = thread_id;
        self
    }

    /// Attach structured parts.
    pub fn with_parts(mut self, parts: Option<Vec<serde_json::Value>>) -> Self {
        self.parts = parts;
        self
    }

    /// Text content, empty when absent.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// Clear the outcome of a previous turn so the message can be streamed
    /// into again.
    pub fn reset_for_retry(&mut self) {
        self.content = Some(String::new());
        self.error = None;
        self.reasoning = None;
        self.created_at = Utc::now();
    }
}
