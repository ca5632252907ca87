//! Duck-typed field extraction for payloads that fail strict validation

use serde_json::Value;

/// Read an identifier that may have been sent as a string or a number.
pub(super) fn id_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a text field. Non-string scalars are stringified.
pub(super) fn text_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Read a sequence number sent as an integer, a float or a numeric string.
pub(super) fn sequence_field(value: &Value, key: &str) -> Option<u64> {
    match value.get(key)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_field_accepts_numbers() {
        let v = json!({"conv_id": 42, "msg_id": "m-1", "other": null});
        assert_eq!(id_field(&v, "conv_id").as_deref(), Some("42"));
        assert_eq!(id_field(&v, "msg_id").as_deref(), Some("m-1"));
        assert_eq!(id_field(&v, "other"), None);
        assert_eq!(id_field(&v, "missing"), None);
    }

    #[test]
    fn test_sequence_field_variants() {
        let v = json!({"a": 3, "b": "7", "c": 2.0, "d": -1, "e": "x"});
        assert_eq!(sequence_field(&v, "a"), Some(3));
        assert_eq!(sequence_field(&v, "b"), Some(7));
        assert_eq!(sequence_field(&v, "c"), Some(2));
        assert_eq!(sequence_field(&v, "d"), None);
        assert_eq!(sequence_field(&v, "e"), None);
    }

    #[test]
    fn test_text_field_on_non_object() {
        assert_eq!(text_field(&json!("bare"), "content"), None);
        assert_eq!(text_field(&json!({"content": true}), "content").as_deref(), Some("true"));
    }
}
