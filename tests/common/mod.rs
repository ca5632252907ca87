//! Common test utilities for integration tests.
//!
//! Frame builders for chat streams and helpers for building stores backed
//! by the mock HTTP client.
//!
//! # Example
//!
//! ```ignore
//! let mock = MockHttpClient::new();
//! mock.set_default_response(MockResponse::sse(simple_reply("c1", "Hello")));
//! let mut store = test_store(&mock);
//! ```

#![allow(dead_code)]

pub mod mocks;

pub use mocks::*;

use std::sync::Arc;

use donkin::{ChatStore, StreamTransport};

pub const TEST_ENDPOINT: &str = "http://test.local/v1/chat";

/// One SSE frame with LF line endings.
pub fn sse_frame(event: &str, data: &str) -> String {
    format!("event: {}\ndata: {}\n\n", event, data)
}

/// One SSE frame with CRLF line endings.
pub fn sse_frame_crlf(event: &str, data: &str) -> String {
    format!("event: {}\r\ndata: {}\r\n\r\n", event, data)
}

pub fn message_start(conv_id: &str, msg_id: &str) -> String {
    sse_frame(
        "message_start",
        &serde_json::json!({"conv_id": conv_id, "msg_id": msg_id}).to_string(),
    )
}

pub fn thinking(content: &str, sequence: u64) -> String {
    sse_frame(
        "thinking",
        &serde_json::json!({"content": content, "sequence": sequence}).to_string(),
    )
}

pub fn message(content: &str, sequence: u64) -> String {
    sse_frame(
        "message",
        &serde_json::json!({"content": content, "sequence": sequence}).to_string(),
    )
}

pub fn message_end(conv_id: &str, msg_id: &str, content: Option<&str>) -> String {
    let mut data = serde_json::json!({"conv_id": conv_id, "msg_id": msg_id});
    if let Some(content) = content {
        data["content"] = serde_json::Value::from(content);
    }
    sse_frame("message_end", &data.to_string())
}

pub fn heartbeat() -> String {
    ": keep-alive\n\n".to_string()
}

/// A complete reply: start, one message per part, end.
pub fn simple_reply(conv_id: &str, parts: &[&str]) -> Vec<String> {
    let mut frames = vec![message_start(conv_id, "msg-1")];
    for (i, part) in parts.iter().enumerate() {
        frames.push(message(part, i as u64 + 1));
    }
    frames.push(message_end(conv_id, "msg-1", None));
    frames
}

/// Store pointed at [`TEST_ENDPOINT`] through `mock`.
pub fn test_store(mock: &MockHttpClient) -> ChatStore {
    ChatStore::new(StreamTransport::new(Arc::new(mock.clone())), TEST_ENDPOINT)
}
