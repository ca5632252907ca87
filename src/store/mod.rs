//! Chat store: the single owner of the transcript and turn status.
//!
//! All mutation goes through the store's methods. A turn runs in a spawned
//! task that never touches the state; it reports back through
//! [`StoreMessage`]s, which the owner applies with
//! [`ChatStore::handle_message`] (or lets [`ChatStore::process_next`] /
//! [`ChatStore::settle`] pull from the store's own receiver).
//!
//! At most one turn streams at a time. Each turn gets a fresh
//! [`CancellationToken`]; starting a new turn cancels the previous token.

mod actions;
mod crud;
mod messages;
mod state;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::models::{ChatMessage, Reasoning};
use crate::transport::StreamTransport;

pub use messages::StoreMessage;
pub use state::{ChatState, ChatStatus};

/// Builds the request body from the history and thread id.
pub type RequestTransform =
    Arc<dyn Fn(&[ChatMessage], Option<&str>) -> serde_json::Value + Send + Sync>;

/// Replaces the built-in retry behaviour for a message id.
pub type RetryHandler = Box<dyn FnOnce(&str) + Send>;

/// Optional hooks for a [`ChatStore`].
#[derive(Clone, Default)]
pub struct ChatStoreOptions {
    /// Called after every [`ChatStore::handle_cancel`].
    pub on_cancel: Option<Arc<dyn Fn() + Send + Sync>>,
    /// Replaces the default `{ messages, id }` request body.
    pub request_transform: Option<RequestTransform>,
}

impl std::fmt::Debug for ChatStoreOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStoreOptions")
            .field("on_cancel", &self.on_cancel.is_some())
            .field("request_transform", &self.request_transform.is_some())
            .finish()
    }
}

pub struct ChatStore {
    state: ChatState,
    transport: StreamTransport,
    endpoint: String,
    options: ChatStoreOptions,
    /// Token of the most recent turn; `None` once that turn has ended
    abort: Option<CancellationToken>,
    /// Incremented for every turn; tags [`StoreMessage`]s
    turn: u64,
    /// Whether the current turn's task has not reported its end yet
    in_flight: bool,
    message_tx: mpsc::UnboundedSender<StoreMessage>,
    message_rx: Option<mpsc::UnboundedReceiver<StoreMessage>>,
}

impl ChatStore {
    pub fn new(transport: StreamTransport, endpoint: impl Into<String>) -> Self {
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        Self {
            state: ChatState::default(),
            transport,
            endpoint: endpoint.into(),
            options: ChatStoreOptions::default(),
            abort: None,
            turn: 0,
            in_flight: false,
            message_tx,
            message_rx: Some(message_rx),
        }
    }

    pub fn with_options(mut self, options: ChatStoreOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_thread_id(mut self, thread_id: Option<String>) -> Self {
        self.state.thread_id = thread_id;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.state.enabled = enabled;
        self
    }

    /// Query the state through a selector.
    pub fn select<T>(&self, selector: impl FnOnce(&ChatState) -> T) -> T {
        selector(&self.state)
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn status(&self) -> ChatStatus {
        self.state.status
    }

    pub fn is_streaming(&self) -> bool {
        self.state.status.is_streaming()
    }

    /// Whether a turn task is still running.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.state.input = input.into();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.state.enabled = enabled;
    }

    pub fn set_thread_id(&mut self, thread_id: Option<String>) {
        self.state.thread_id = thread_id;
    }

    /// Take the receiver to drive [`ChatStore::handle_message`] from an
    /// external loop. After this, [`ChatStore::process_next`] returns `None`.
    pub fn take_message_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<StoreMessage>> {
        self.message_rx.take()
    }

    /// Wait for one message on the store's own receiver and apply it.
    /// Returns the applied message, or `None` if the receiver was taken.
    pub async fn process_next(&mut self) -> Option<StoreMessage> {
        let message = self.message_rx.as_mut()?.recv().await?;
        self.handle_message(message.clone());
        Some(message)
    }

    /// Apply every message already queued, without waiting.
    pub fn drain_messages(&mut self) -> usize {
        let mut applied = 0;
        while let Some(message) = self.message_rx.as_mut().and_then(|rx| rx.try_recv().ok()) {
            self.handle_message(message);
            applied += 1;
        }
        applied
    }

    /// Apply messages until the current turn's task has ended.
    pub async fn settle(&mut self) {
        while self.in_flight {
            if self.process_next().await.is_none() {
                break;
            }
        }
    }

    /// Apply one update from a turn task.
    pub fn handle_message(&mut self, message: StoreMessage) {
        if message.turn() != self.turn {
            tracing::debug!(
                turn = message.turn(),
                current = self.turn,
                "Dropping message from a superseded turn"
            );
            return;
        }
        if message.is_terminal() {
            self.in_flight = false;
        }

        match message {
            StoreMessage::MessageStarted {
                message_id,
                conv_id,
                ..
            } => {
                if !self.is_streaming() {
                    return;
                }
                if self.state.thread_id.is_none() && !conv_id.is_empty() {
                    tracing::info!(thread_id = %conv_id, "Adopting thread id from backend");
                    self.state.thread_id = Some(conv_id.clone());
                    for item in self.state.items.iter_mut() {
                        if item.thread_id.is_none() {
                            item.thread_id = Some(conv_id.clone());
                        }
                    }
                }
                tracing::debug!(%message_id, "Assistant message started");
            }
            StoreMessage::ReasoningUpdated {
                message_id,
                content,
                ..
            } => {
                if !self.is_streaming() {
                    return;
                }
                self.update_message(&message_id, |msg| {
                    let reasoning = msg.reasoning.get_or_insert_with(Reasoning::default);
                    reasoning.content = content;
                });
            }
            StoreMessage::ReasoningFinished {
                message_id,
                duration,
                ..
            } => {
                if !self.is_streaming() {
                    return;
                }
                self.update_message(&message_id, |msg| {
                    let reasoning = msg.reasoning.get_or_insert_with(Reasoning::default);
                    reasoning.duration = Some(duration.as_millis() as u64);
                });
            }
            StoreMessage::TextUpdated {
                message_id,
                content,
                ..
            } => {
                if !self.is_streaming() {
                    return;
                }
                self.update_message(&message_id, |msg| msg.content = Some(content));
            }
            StoreMessage::MessageEnded {
                message_id,
                content,
                ..
            } => {
                if !self.is_streaming() {
                    return;
                }
                if let Some(content) = content {
                    self.update_message(&message_id, |msg| msg.content = Some(content));
                }
                self.state.status = ChatStatus::Success;
                tracing::info!(%message_id, "Turn completed");
            }
            StoreMessage::TurnFinished {
                message_id,
                completed,
                ..
            } => {
                self.abort = None;
                if self.is_streaming() {
                    if !completed {
                        tracing::warn!(%message_id, "Stream ended without message_end");
                    }
                    self.state.status = ChatStatus::Success;
                }
            }
            StoreMessage::TurnFailed {
                message_id, error, ..
            } => {
                self.abort = None;
                if !self.is_streaming() {
                    tracing::debug!(%message_id, code = %error.code, "Ignoring failure after turn settled");
                    return;
                }
                tracing::error!(%message_id, code = %error.code, "Turn failed: {}", error.message);
                self.update_message(&message_id, |msg| msg.error = Some(error));
                self.state.status = ChatStatus::Error;
            }
            StoreMessage::TurnCancelled { message_id, .. } => {
                self.abort = None;
                tracing::info!(%message_id, "Turn cancelled");
            }
        }
    }
}

impl std::fmt::Debug for ChatStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStore")
            .field("endpoint", &self.endpoint)
            .field("status", &self.state.status)
            .field("items", &self.state.items.len())
            .field("turn", &self.turn)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}
