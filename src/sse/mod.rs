//! SSE (Server-Sent Events) stream handling for the chat backend
//!
//! The backend streams frames of the form:
//! - `event: <message_start|heartbeat|thinking|message|message_end|error>`
//! - `data: <json>`
//! - a blank line (`\n\n` or `\r\n\r\n`) ending the frame
//! - or a bare `: ping` comment as a heartbeat
//!
//! # Module structure
//! - `events` - typed events, best-effort partial events, frame parse errors
//! - `decoder` - format detection and frame splitting over raw bytes
//! - `payloads` - strict payload deserialization structs
//! - `parser` - frame interpretation with JSON recovery and lenient fallback

mod decoder;
mod events;
mod parser;
mod payloads;

pub use decoder::{Delimiter, FrameDecoder, StreamFormat};
pub use events::{
    BackendFailure, ChatStreamEvent, MessageDelta, MessageEnd, MessageStart, ParsedEvent,
    PartialEvent, SseLine, SseParseError, ThinkingDelta,
};
pub use parser::{interpret_frame, parse_chat_event, parse_sse_line};
