//! Messages sent from a turn's stream task back to the store.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::ChatError;
use crate::models::MessageError;
use crate::sse::{MessageEnd, MessageStart, SseParseError};
use crate::traits::StreamHandler;

/// Update for the store, tagged with the turn that produced it.
///
/// A message whose `turn` is not the store's current turn is stale and is
/// dropped by [`crate::store::ChatStore::handle_message`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreMessage {
    MessageStarted {
        turn: u64,
        message_id: String,
        conv_id: String,
    },
    ReasoningUpdated {
        turn: u64,
        message_id: String,
        content: String,
    },
    ReasoningFinished {
        turn: u64,
        message_id: String,
        duration: Duration,
    },
    TextUpdated {
        turn: u64,
        message_id: String,
        content: String,
    },
    MessageEnded {
        turn: u64,
        message_id: String,
        content: Option<String>,
    },
    /// The stream closed normally. `completed` is false when no
    /// `message_end` was seen.
    TurnFinished {
        turn: u64,
        message_id: String,
        completed: bool,
    },
    TurnFailed {
        turn: u64,
        message_id: String,
        error: MessageError,
    },
    TurnCancelled {
        turn: u64,
        message_id: String,
    },
}

impl StoreMessage {
    pub fn turn(&self) -> u64 {
        match self {
            StoreMessage::MessageStarted { turn, .. }
            | StoreMessage::ReasoningUpdated { turn, .. }
            | StoreMessage::ReasoningFinished { turn, .. }
            | StoreMessage::TextUpdated { turn, .. }
            | StoreMessage::MessageEnded { turn, .. }
            | StoreMessage::TurnFinished { turn, .. }
            | StoreMessage::TurnFailed { turn, .. }
            | StoreMessage::TurnCancelled { turn, .. } => *turn,
        }
    }

    pub fn message_id(&self) -> &str {
        match self {
            StoreMessage::MessageStarted { message_id, .. }
            | StoreMessage::ReasoningUpdated { message_id, .. }
            | StoreMessage::ReasoningFinished { message_id, .. }
            | StoreMessage::TextUpdated { message_id, .. }
            | StoreMessage::MessageEnded { message_id, .. }
            | StoreMessage::TurnFinished { message_id, .. }
            | StoreMessage::TurnFailed { message_id, .. }
            | StoreMessage::TurnCancelled { message_id, .. } => message_id,
        }
    }

    /// Whether this message ends the turn's task.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StoreMessage::TurnFinished { .. }
                | StoreMessage::TurnFailed { .. }
                | StoreMessage::TurnCancelled { .. }
        )
    }
}

/// [`StreamHandler`] that forwards every callback to the store's channel.
pub(crate) struct ChannelHandler {
    pub(crate) tx: mpsc::UnboundedSender<StoreMessage>,
    pub(crate) turn: u64,
    pub(crate) message_id: String,
}

impl ChannelHandler {
    pub(crate) fn send(&self, message: StoreMessage) {
        // The store may have been dropped mid-turn; nothing left to update.
        let _ = self.tx.send(message);
    }

    pub(crate) fn finished(&self, completed: bool) {
        self.send(StoreMessage::TurnFinished {
            turn: self.turn,
            message_id: self.message_id.clone(),
            completed,
        });
    }

    pub(crate) fn cancelled(&self) {
        self.send(StoreMessage::TurnCancelled {
            turn: self.turn,
            message_id: self.message_id.clone(),
        });
    }
}

impl StreamHandler for ChannelHandler {
    fn on_message_start(&mut self, start: &MessageStart) {
        self.send(StoreMessage::MessageStarted {
            turn: self.turn,
            message_id: self.message_id.clone(),
            conv_id: start.conv_id.clone(),
        });
    }

    fn on_thinking(&mut self, accumulated: &str) {
        self.send(StoreMessage::ReasoningUpdated {
            turn: self.turn,
            message_id: self.message_id.clone(),
            content: accumulated.to_string(),
        });
    }

    fn on_reasoning_done(&mut self, duration: Duration) {
        self.send(StoreMessage::ReasoningFinished {
            turn: self.turn,
            message_id: self.message_id.clone(),
            duration,
        });
    }

    fn on_text_part(&mut self, accumulated: &str) {
        self.send(StoreMessage::TextUpdated {
            turn: self.turn,
            message_id: self.message_id.clone(),
            content: accumulated.to_string(),
        });
    }

    fn on_message_end(&mut self, end: &MessageEnd) {
        self.send(StoreMessage::MessageEnded {
            turn: self.turn,
            message_id: self.message_id.clone(),
            content: end.content.clone(),
        });
    }

    fn on_error(&mut self, error: &ChatError) {
        self.send(StoreMessage::TurnFailed {
            turn: self.turn,
            message_id: self.message_id.clone(),
            error: MessageError::from(error),
        });
    }

    fn on_frame_skipped(&mut self, error: &SseParseError) {
        tracing::debug!(message_id = %self.message_id, error = %error, "Frame skipped");
    }
}
