use serde::{Deserialize, Serialize};

use crate::models::ChatMessage;

/// Lifecycle of the current turn.
///
/// `Idle -> Streaming` on submit or retry, then `Success` on `message_end`
/// or a clean close, `Error` on failure, or `Idle` on cancel. `Success` and
/// `Error` are left by the next submit or retry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatStatus {
    #[default]
    Idle,
    Streaming,
    Success,
    Error,
}

impl ChatStatus {
    pub fn is_streaming(self) -> bool {
        self == ChatStatus::Streaming
    }
}

/// Everything the UI may observe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatState {
    pub items: Vec<ChatMessage>,
    pub status: ChatStatus,
    pub input: String,
    pub thread_id: Option<String>,
    pub enabled: bool,
}

impl Default for ChatState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            status: ChatStatus::Idle,
            input: String::new(),
            thread_id: None,
            enabled: true,
        }
    }
}
