//! SSE payload deserialization structs
//!
//! Strict schemas for the JSON carried on `data:` lines. A payload that
//! fails these goes through the lenient extractor instead.

use serde::Deserialize;

/// `message_start` payload
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MessageStartPayload {
    pub conv_id: String,
    pub msg_id: String,
}

/// `thinking` and `message` payload
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ContentPayload {
    pub content: String,
    pub sequence: u64,
}

/// `message_end` payload
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MessageEndPayload {
    pub conv_id: String,
    pub msg_id: String,
    #[serde(default)]
    pub content: Option<String>,
}
