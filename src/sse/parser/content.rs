//! Content and thinking event parsers

use serde_json::Value;

use super::lenient::{sequence_field, text_field};
use crate::sse::events::{
    ChatStreamEvent, MessageDelta, ParsedEvent, PartialEvent, SseParseError, ThinkingDelta,
};
use crate::sse::payloads::ContentPayload;

/// Which buffer a content payload feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ContentKind {
    Thinking,
    Message,
}

/// Parse a `thinking` or `message` payload.
pub(super) fn parse_content_event(
    kind: ContentKind,
    event_type: &str,
    value: Value,
) -> Result<ParsedEvent, SseParseError> {
    match serde_json::from_value::<ContentPayload>(value.clone()) {
        Ok(ContentPayload { content, sequence }) => Ok(ParsedEvent::Strict(match kind {
            ContentKind::Thinking => ChatStreamEvent::Thinking(ThinkingDelta { content, sequence }),
            ContentKind::Message => ChatStreamEvent::Message(MessageDelta { content, sequence }),
        })),
        Err(e) => {
            // A bare string payload is taken as the content itself.
            let (content, sequence) = match &value {
                Value::Object(_) => (
                    text_field(&value, "content")
                        .or_else(|| text_field(&value, "text"))
                        .or_else(|| text_field(&value, "delta")),
                    sequence_field(&value, "sequence"),
                ),
                Value::String(s) => (Some(s.clone()), None),
                _ => {
                    return Err(SseParseError::SchemaMismatch {
                        event_type: event_type.to_string(),
                        source: e.to_string(),
                    })
                }
            };
            tracing::warn!(event_type, error = %e, "Schema mismatch, using best-effort extraction");
            Ok(ParsedEvent::BestEffort(match kind {
                ContentKind::Thinking => PartialEvent::Thinking { content, sequence },
                ContentKind::Message => PartialEvent::Message { content, sequence },
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strict_message() {
        let parsed = parse_content_event(
            ContentKind::Message,
            "message",
            json!({"content": "Hello", "sequence": 1}),
        )
        .unwrap();
        assert_eq!(
            parsed,
            ParsedEvent::Strict(ChatStreamEvent::Message(MessageDelta {
                content: "Hello".to_string(),
                sequence: 1,
            }))
        );
    }

    #[test]
    fn test_strict_thinking() {
        let parsed = parse_content_event(
            ContentKind::Thinking,
            "thinking",
            json!({"content": "hmm", "sequence": 0}),
        )
        .unwrap();
        assert!(matches!(
            parsed,
            ParsedEvent::Strict(ChatStreamEvent::Thinking(ThinkingDelta { ref content, .. })) if content == "hmm"
        ));
    }

    #[test]
    fn test_missing_sequence_falls_back() {
        let parsed =
            parse_content_event(ContentKind::Message, "message", json!({"content": "Hi"})).unwrap();
        assert_eq!(
            parsed,
            ParsedEvent::BestEffort(PartialEvent::Message {
                content: Some("Hi".to_string()),
                sequence: None,
            })
        );
    }

    #[test]
    fn test_string_sequence_and_text_alias() {
        let parsed = parse_content_event(
            ContentKind::Message,
            "message",
            json!({"text": "Hi", "sequence": "4"}),
        )
        .unwrap();
        assert_eq!(
            parsed,
            ParsedEvent::BestEffort(PartialEvent::Message {
                content: Some("Hi".to_string()),
                sequence: Some(4),
            })
        );
    }

    #[test]
    fn test_bare_string_payload() {
        let parsed =
            parse_content_event(ContentKind::Thinking, "thinking", json!("pondering")).unwrap();
        assert_eq!(
            parsed.into_event(),
            ChatStreamEvent::Thinking(ThinkingDelta {
                content: "pondering".to_string(),
                sequence: 0,
            })
        );
    }

    #[test]
    fn test_number_payload_is_schema_mismatch() {
        let err = parse_content_event(ContentKind::Message, "message", json!(12)).unwrap_err();
        assert!(matches!(err, SseParseError::SchemaMismatch { .. }));
    }
}
