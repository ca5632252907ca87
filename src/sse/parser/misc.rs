//! Error event parser

use serde_json::Value;

use super::lenient::text_field;
use super::recovery::parse_json_value;
use crate::sse::events::{BackendFailure, ChatStreamEvent, ParsedEvent};

/// Parse an `error` event. The payload has no agreed shape, so this never
/// fails: anything unreadable becomes the message verbatim.
pub(super) fn parse_error_event(data: Option<&str>) -> ParsedEvent {
    let Some(data) = data else {
        return ParsedEvent::Strict(ChatStreamEvent::Error(BackendFailure {
            message: "The assistant reported an error".to_string(),
            code: None,
            raw: Value::Null,
        }));
    };

    let raw = parse_json_value("error", data).unwrap_or_else(|_| Value::String(data.to_string()));
    let message = error_message(&raw).unwrap_or_else(|| data.to_string());
    let code = text_field(&raw, "code").or_else(|| text_field(&raw, "type"));

    ParsedEvent::Strict(ChatStreamEvent::Error(BackendFailure { message, code, raw }))
}

fn error_message(raw: &Value) -> Option<String> {
    if let Value::String(s) = raw {
        return Some(s.clone());
    }
    text_field(raw, "message")
        .or_else(|| raw.get("error").and_then(|e| text_field(e, "message")))
        .or_else(|| text_field(raw, "error"))
        .or_else(|| text_field(raw, "detail"))
}
