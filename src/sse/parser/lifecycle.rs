//! message_start and message_end parsers

use serde_json::Value;

use super::lenient::{id_field, text_field};
use crate::sse::events::{
    ChatStreamEvent, MessageEnd, MessageStart, ParsedEvent, PartialEvent, SseParseError,
};
use crate::sse::payloads::{MessageEndPayload, MessageStartPayload};

/// Parse message_start, falling back to manual `conv_id`/`msg_id` reads.
pub(super) fn parse_message_start_event(
    event_type: &str,
    value: Value,
) -> Result<ParsedEvent, SseParseError> {
    match serde_json::from_value::<MessageStartPayload>(value.clone()) {
        Ok(payload) => Ok(ParsedEvent::Strict(ChatStreamEvent::MessageStart(MessageStart {
            conv_id: payload.conv_id,
            msg_id: payload.msg_id,
        }))),
        Err(e) => {
            if !value.is_object() {
                return Err(SseParseError::SchemaMismatch {
                    event_type: event_type.to_string(),
                    source: e.to_string(),
                });
            }
            tracing::warn!(event_type, error = %e, "Schema mismatch, using best-effort extraction");
            Ok(ParsedEvent::BestEffort(PartialEvent::MessageStart {
                conv_id: id_field(&value, "conv_id"),
                msg_id: id_field(&value, "msg_id"),
            }))
        }
    }
}

/// Parse message_end, falling back to manual field reads.
pub(super) fn parse_message_end_event(
    event_type: &str,
    value: Value,
) -> Result<ParsedEvent, SseParseError> {
    match serde_json::from_value::<MessageEndPayload>(value.clone()) {
        Ok(payload) => Ok(ParsedEvent::Strict(ChatStreamEvent::MessageEnd(MessageEnd {
            conv_id: payload.conv_id,
            msg_id: payload.msg_id,
            content: payload.content,
        }))),
        Err(e) => {
            if !value.is_object() {
                return Err(SseParseError::SchemaMismatch {
                    event_type: event_type.to_string(),
                    source: e.to_string(),
                });
            }
            tracing::warn!(event_type, error = %e, "Schema mismatch, using best-effort extraction");
            Ok(ParsedEvent::BestEffort(PartialEvent::MessageEnd {
                conv_id: id_field(&value, "conv_id"),
                msg_id: id_field(&value, "msg_id"),
                content: text_field(&value, "content"),
            }))
        }
    }
}
