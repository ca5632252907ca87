//! Event interpreter
//!
//! Turns one decoded frame into a [`ParsedEvent`]. Problems with a single
//! frame come back as [`SseParseError`] for the caller to log and skip.

mod content;
mod lenient;
mod lifecycle;
mod misc;
mod recovery;

use crate::sse::events::{ChatStreamEvent, ParsedEvent, SseLine, SseParseError};

use content::{parse_content_event, ContentKind};
use lifecycle::{parse_message_end_event, parse_message_start_event};
use misc::parse_error_event;
use recovery::parse_json_value;

/// Parse a single SSE line into its component type
pub fn parse_sse_line(line: &str) -> SseLine {
    if line.trim().is_empty() {
        return SseLine::Empty;
    }

    if let Some(stripped) = line.strip_prefix(':') {
        return SseLine::Comment(stripped.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("event:") {
        return SseLine::Event(rest.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("data:") {
        return SseLine::Data(rest.strip_prefix(' ').unwrap_or(rest).to_string());
    }

    // Unknown line format - treat as comment
    SseLine::Comment(line.to_string())
}

/// Interpret one frame (the text between two delimiters).
///
/// A frame made only of comments, such as `: ping`, is a heartbeat.
/// Multiple `data:` lines are joined with `\n`.
pub fn interpret_frame(frame: &str) -> Result<ParsedEvent, SseParseError> {
    let mut event_type: Option<String> = None;
    let mut data: Vec<String> = Vec::new();
    let mut only_comments = true;

    for line in frame.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        match parse_sse_line(line) {
            SseLine::Event(name) => {
                only_comments = false;
                event_type = Some(name);
            }
            SseLine::Data(payload) => {
                only_comments = false;
                data.push(payload);
            }
            SseLine::Comment(_) | SseLine::Empty => {}
        }
    }

    if only_comments {
        return Ok(ParsedEvent::Strict(ChatStreamEvent::Heartbeat));
    }

    let event_type = event_type.ok_or(SseParseError::MissingEventLine)?;
    let data = if data.is_empty() {
        None
    } else {
        Some(data.join("\n"))
    };

    parse_chat_event(&event_type, data.as_deref())
}

/// Parse an event name and its (optional) data into a typed event.
pub fn parse_chat_event(
    event_type: &str,
    data: Option<&str>,
) -> Result<ParsedEvent, SseParseError> {
    match event_type {
        "heartbeat" | "ping" => return Ok(ParsedEvent::Strict(ChatStreamEvent::Heartbeat)),
        "error" => return Ok(parse_error_event(data)),
        "message_start" | "thinking" | "message" | "message_end" => {}
        other => return Err(SseParseError::UnknownEventType(other.to_string())),
    }

    let data = data.ok_or_else(|| SseParseError::MissingDataLine {
        event_type: event_type.to_string(),
    })?;
    let value = parse_json_value(event_type, data)?;

    match event_type {
        "message_start" => parse_message_start_event(event_type, value),
        "message_end" => parse_message_end_event(event_type, value),
        "thinking" => parse_content_event(ContentKind::Thinking, event_type, value),
        _ => parse_content_event(ContentKind::Message, event_type, value),
    }
}
