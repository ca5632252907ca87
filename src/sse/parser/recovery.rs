//! JSON recovery for data lines that carry noise around the payload

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::sse::events::SseParseError;

/// First `{` through last `}`, or first `[` through last `]`.
static EMBEDDED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(\{.*\}|\[.*\])").expect("Invalid embedded JSON regex"));

/// Parse `data` as JSON, retrying on the first object- or array-looking
/// substring when the whole line does not parse.
pub(super) fn parse_json_value(event_type: &str, data: &str) -> Result<Value, SseParseError> {
    let first_err = match serde_json::from_str::<Value>(data) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    if let Some(candidate) = EMBEDDED_JSON.find(data) {
        if let Ok(value) = serde_json::from_str::<Value>(candidate.as_str()) {
            tracing::debug!(event_type, "Recovered JSON payload from noisy data line");
            return Ok(value);
        }
    }

    Err(SseParseError::InvalidJson {
        event_type: event_type.to_string(),
        source: first_err.to_string(),
    })
}
