//! Direct transcript edits for the ChatStore.

use super::ChatStore;
use crate::models::{ChatMessage, MessageRole};

impl ChatStore {
    pub fn push_message(&mut self, message: ChatMessage) {
        self.state.items.push(message);
    }

    /// Apply `f` to the message with `id`. Returns false if there is none.
    pub fn update_message<F>(&mut self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut ChatMessage),
    {
        match self.state.items.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                f(message);
                true
            }
            None => {
                tracing::debug!(message_id = id, "Update for unknown message");
                false
            }
        }
    }

    pub fn delete_message(&mut self, id: &str) -> Option<ChatMessage> {
        let index = self.state.items.iter().position(|m| m.id == id)?;
        Some(self.state.items.remove(index))
    }

    pub fn delete_last_message(&mut self) -> Option<ChatMessage> {
        self.state.items.pop()
    }

    pub fn get_message(&self, id: &str) -> Option<&ChatMessage> {
        self.state.items.iter().find(|m| m.id == id)
    }

    pub fn get_last_message(&self) -> Option<&ChatMessage> {
        self.state.items.last()
    }

    pub fn get_latest_user_message(&self) -> Option<&ChatMessage> {
        self.state
            .items
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
    }

    /// Overwrite the content of the last message. Returns false when empty.
    pub fn update_last_message_content(&mut self, content: impl Into<String>) -> bool {
        match self.state.items.last_mut() {
            Some(message) => {
                message.content = Some(content.into());
                true
            }
            None => false,
        }
    }

    /// Drop every message and forget the thread.
    pub fn clear_messages(&mut self) {
        self.state.items.clear();
        self.state.thread_id = None;
    }
}
