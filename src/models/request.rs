use serde::{Deserialize, Serialize};

use super::message::ChatMessage;

/// Default request body for the chat stream endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    /// Conversation so far, oldest first
    pub messages: Vec<ChatMessage>,
    /// Thread ID - None lets the backend start a new thread
    pub id: Option<String>,
}

impl ChatRequest {
    /// Build a request from the transcript.
    pub fn new(messages: &[ChatMessage], thread_id: Option<&str>) -> Self {
        Self {
            messages: messages.to_vec(),
            id: thread_id.map(str::to_string),
        }
    }

    /// Serialize into the JSON value handed to the transport.
    pub fn to_value(&self) -> serde_json::Value {
        // A struct of strings, options and vecs cannot fail to serialize.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_shape() {
        let messages = vec![ChatMessage::user("hello")];
        let value = ChatRequest::new(&messages, Some("thread-1")).to_value();
        assert_eq!(value["id"], "thread-1");
        assert_eq!(value["messages"][0]["content"], "hello");
    }

    #[test]
    fn test_chat_request_without_thread() {
        let value = ChatRequest::new(&[], None).to_value();
        assert!(value["id"].is_null());
        assert_eq!(value["messages"].as_array().unwrap().len(), 0);
    }
}
