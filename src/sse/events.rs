//! SSE event types and definitions
//!
//! Contains the typed events of the chat stream protocol, the best-effort
//! variants produced when a payload does not match its schema, and the
//! frame-level parse errors.

use serde::{Deserialize, Serialize};

/// `message_start`: the backend opened an assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageStart {
    pub conv_id: String,
    pub msg_id: String,
}

/// `thinking`: a piece of the reasoning trace.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThinkingDelta {
    pub content: String,
    pub sequence: u64,
}

/// `message`: a piece of the reply text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageDelta {
    pub content: String,
    pub sequence: u64,
}

/// `message_end`: terminal event for one assistant turn.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageEnd {
    pub conv_id: String,
    pub msg_id: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// `error`: the backend gave up on the turn. The payload has no fixed shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendFailure {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub raw: serde_json::Value,
}

/// Typed events of the chat stream
#[derive(Debug, Clone, PartialEq)]
pub enum ChatStreamEvent {
    MessageStart(MessageStart),
    /// `heartbeat` event or a `: ping` comment frame
    Heartbeat,
    Thinking(ThinkingDelta),
    Message(MessageDelta),
    MessageEnd(MessageEnd),
    Error(BackendFailure),
}

impl ChatStreamEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            ChatStreamEvent::MessageStart(_) => "message_start",
            ChatStreamEvent::Heartbeat => "heartbeat",
            ChatStreamEvent::Thinking(_) => "thinking",
            ChatStreamEvent::Message(_) => "message",
            ChatStreamEvent::MessageEnd(_) => "message_end",
            ChatStreamEvent::Error(_) => "error",
        }
    }
}

/// Fields recovered from a payload that failed strict validation.
///
/// Every field is optional; nothing here is trusted until
/// [`PartialEvent::into_event`] fills the gaps with empty defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartialEvent {
    MessageStart {
        conv_id: Option<String>,
        msg_id: Option<String>,
    },
    Thinking {
        content: Option<String>,
        sequence: Option<u64>,
    },
    Message {
        content: Option<String>,
        sequence: Option<u64>,
    },
    MessageEnd {
        conv_id: Option<String>,
        msg_id: Option<String>,
        content: Option<String>,
    },
}

impl PartialEvent {
    /// Wire name of the event this was extracted for.
    pub fn name(&self) -> &'static str {
        match self {
            PartialEvent::MessageStart { .. } => "message_start",
            PartialEvent::Thinking { .. } => "thinking",
            PartialEvent::Message { .. } => "message",
            PartialEvent::MessageEnd { .. } => "message_end",
        }
    }

    /// Widen into a typed event, substituting defaults for missing fields.
    pub fn into_event(self) -> ChatStreamEvent {
        match self {
            PartialEvent::MessageStart { conv_id, msg_id } => {
                ChatStreamEvent::MessageStart(MessageStart {
                    conv_id: conv_id.unwrap_or_default(),
                    msg_id: msg_id.unwrap_or_default(),
                })
            }
            PartialEvent::Thinking { content, sequence } => {
                ChatStreamEvent::Thinking(ThinkingDelta {
                    content: content.unwrap_or_default(),
                    sequence: sequence.unwrap_or_default(),
                })
            }
            PartialEvent::Message { content, sequence } => {
                ChatStreamEvent::Message(MessageDelta {
                    content: content.unwrap_or_default(),
                    sequence: sequence.unwrap_or_default(),
                })
            }
            PartialEvent::MessageEnd {
                conv_id,
                msg_id,
                content,
            } => ChatStreamEvent::MessageEnd(MessageEnd {
                conv_id: conv_id.unwrap_or_default(),
                msg_id: msg_id.unwrap_or_default(),
                content,
            }),
        }
    }
}

/// Result of interpreting one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedEvent {
    /// The payload matched its schema.
    Strict(ChatStreamEvent),
    /// The payload failed validation; fields were extracted by hand.
    BestEffort(PartialEvent),
}

impl ParsedEvent {
    /// Collapse into a typed event.
    pub fn into_event(self) -> ChatStreamEvent {
        match self {
            ParsedEvent::Strict(event) => event,
            ParsedEvent::BestEffort(partial) => partial.into_event(),
        }
    }

    /// Whether the strict schema was satisfied.
    pub fn is_strict(&self) -> bool {
        matches!(self, ParsedEvent::Strict(_))
    }
}

/// Parsed SSE line types
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    /// Event type line: "event: <type>"
    Event(String),
    /// Data line: "data: <payload>"
    Data(String),
    /// Empty line (event boundary)
    Empty,
    /// Comment line (starts with ':')
    Comment(String),
}

/// Frame-level parse errors. None of these end the turn.
#[derive(Debug, Clone, PartialEq)]
pub enum SseParseError {
    /// Frame has data but no `event:` line
    MissingEventLine,
    /// Frame has an `event:` line but no `data:` line
    MissingDataLine { event_type: String },
    /// Data is not JSON, even after recovery
    InvalidJson { event_type: String, source: String },
    /// Event name is not part of the protocol
    UnknownEventType(String),
    /// Payload is JSON but nothing usable could be extracted from it
    SchemaMismatch { event_type: String, source: String },
}

impl std::fmt::Display for SseParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SseParseError::MissingEventLine => write!(f, "Frame has no event line"),
            SseParseError::MissingDataLine { event_type } => {
                write!(f, "Missing data for event type: {}", event_type)
            }
            SseParseError::InvalidJson { event_type, source } => {
                write!(f, "Invalid JSON for event '{}': {}", event_type, source)
            }
            SseParseError::UnknownEventType(t) => write!(f, "Unknown SSE event type: {}", t),
            SseParseError::SchemaMismatch { event_type, source } => {
                write!(f, "Unusable payload for event '{}': {}", event_type, source)
            }
        }
    }
}

impl std::error::Error for SseParseError {}
