//! Submit, retry and cancel for the ChatStore.

use tokio_util::sync::CancellationToken;

use super::messages::{ChannelHandler, StoreMessage};
use super::{ChatStatus, ChatStore, RetryHandler};
use crate::error::{ChatError, ErrorContext, ResultExt, StreamError};
use crate::models::{ChatMessage, ChatRequest, MessageError, MessageRole};
use crate::processor::{process_stream_events, StreamOutcome};
use crate::traits::StreamHandler;
use crate::transport::StreamTransport;

impl ChatStore {
    /// Append a user message and its assistant stub, then stream the reply.
    ///
    /// `content` wins over the input field when it is non-blank. Returns
    /// false without touching state when the store is disabled, a turn is
    /// streaming, or there is nothing to send.
    ///
    /// The turn runs on the current tokio runtime. Called outside one, the
    /// turn fails at once with `E_STREAM_OTHER` and no request is sent.
    pub fn handle_submit(
        &mut self,
        content: Option<String>,
        parts: Option<Vec<serde_json::Value>>,
    ) -> bool {
        if !self.state.enabled {
            tracing::debug!("Submit ignored: store disabled");
            return false;
        }
        if self.is_streaming() {
            tracing::debug!("Submit ignored: turn already streaming");
            return false;
        }

        let content = match content.filter(|c| !c.trim().is_empty()) {
            Some(content) => content,
            None if !self.state.input.trim().is_empty() => self.state.input.clone(),
            None => return false,
        };

        let thread_id = self.state.thread_id.clone();
        let mut user = ChatMessage::user(content)
            .with_thread(thread_id.clone())
            .with_parts(parts);
        if let Some(last) = self.state.items.last() {
            user = user.with_parent(&last.id);
        }
        let stub = ChatMessage::assistant_stub(&user.id).with_thread(thread_id);
        let stub_id = stub.id.clone();

        self.state.items.push(user);
        self.state.items.push(stub);
        self.state.status = ChatStatus::Streaming;
        self.state.input.clear();

        let history: Vec<ChatMessage> = self
            .state
            .items
            .iter()
            .filter(|m| m.id != stub_id)
            .cloned()
            .collect();
        self.start_stream(&stub_id, history);
        true
    }

    /// Stream a fresh reply for `message_id`.
    ///
    /// With `custom`, the handler is called with the id and nothing else
    /// happens. Otherwise a user message id retries its assistant reply
    /// (inserting one if missing) and an assistant id is reset in place.
    /// The request carries the whole transcript, including messages after
    /// the target.
    pub fn handle_retry(&mut self, message_id: &str, custom: Option<RetryHandler>) -> bool {
        if let Some(handler) = custom {
            handler(message_id);
            return true;
        }
        if !self.state.enabled || self.is_streaming() {
            tracing::debug!(message_id, "Retry ignored");
            return false;
        }

        let Some(index) = self.state.items.iter().position(|m| m.id == message_id) else {
            tracing::warn!(message_id, "Retry target not found");
            return false;
        };

        let target_id = if self.state.items[index].role == MessageRole::User {
            let child = self.state.items[index + 1..]
                .iter()
                .find(|m| {
                    m.role == MessageRole::Assistant && m.parent_id.as_deref() == Some(message_id)
                })
                .map(|m| m.id.clone());
            match child {
                Some(id) => id,
                None => {
                    let stub = ChatMessage::assistant_stub(message_id)
                        .with_thread(self.state.thread_id.clone());
                    let id = stub.id.clone();
                    self.state.items.insert(index + 1, stub);
                    id
                }
            }
        } else {
            message_id.to_string()
        };

        self.update_message(&target_id, ChatMessage::reset_for_retry);
        self.state.status = ChatStatus::Streaming;
        let history = self.state.items.clone();
        self.start_stream(&target_id, history);
        true
    }

    /// Abort the current turn and go back to idle.
    ///
    /// Safe to call at any time; with no turn running it only resets the
    /// status and fires the cancel hook.
    pub fn handle_cancel(&mut self) {
        self.state.status = ChatStatus::Idle;
        if let Some(token) = self.abort.take() {
            tracing::info!(turn = self.turn, "Cancelling active turn");
            token.cancel();
        }
        if let Some(on_cancel) = &self.options.on_cancel {
            on_cancel();
        }
    }

    /// Start a new turn that streams into `target_id`, sending `history`.
    fn start_stream(&mut self, target_id: &str, history: Vec<ChatMessage>) {
        if let Some(previous) = self.abort.take() {
            tracing::debug!(turn = self.turn, "Superseding previous turn");
            previous.cancel();
        }

        let cancel = CancellationToken::new();
        self.abort = Some(cancel.clone());
        self.turn += 1;
        self.in_flight = true;

        let thread_id = self.state.thread_id.clone();
        let payload = match &self.options.request_transform {
            Some(transform) => transform(&history, thread_id.as_deref()),
            None => ChatRequest::new(&history, thread_id.as_deref()).to_value(),
        };

        tracing::info!(
            turn = self.turn,
            message_id = target_id,
            history = history.len(),
            "Starting turn"
        );

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                let err = ChatError::from(StreamError::Other {
                    message: format!("no async runtime to drive the stream: {}", e),
                });
                self.handle_message(StoreMessage::TurnFailed {
                    turn: self.turn,
                    message_id: target_id.to_string(),
                    error: MessageError::from(&err),
                });
                return;
            }
        };

        let handler = ChannelHandler {
            tx: self.message_tx.clone(),
            turn: self.turn,
            message_id: target_id.to_string(),
        };
        runtime.spawn(run_turn(
            self.transport.clone(),
            self.endpoint.clone(),
            payload,
            cancel,
            handler,
            thread_id,
        ));
    }
}

/// Body of a turn task: open the stream and feed it to the processor.
async fn run_turn(
    transport: StreamTransport,
    endpoint: String,
    payload: serde_json::Value,
    cancel: CancellationToken,
    mut handler: ChannelHandler,
    thread_id: Option<String>,
) {
    let opened = transport
        .open_stream(&endpoint, &payload, &cancel)
        .await
        .with_context(|| {
            let ctx = ErrorContext::new("open_stream").with_component("transport");
            match &thread_id {
                Some(id) => ctx.with_thread_id(id),
                None => ctx,
            }
        });

    let stream = match opened {
        Ok(stream) => stream,
        Err(e) if e.is_cancellation() => {
            handler.cancelled();
            return;
        }
        Err(e) => {
            handler.on_error(&e);
            return;
        }
    };

    match process_stream_events(stream, &mut handler, &cancel).await {
        StreamOutcome::Finished(summary) => {
            tracing::debug!(
                frames = summary.frames,
                skipped = summary.skipped,
                "Turn stream finished"
            );
            handler.finished(summary.completed);
        }
        StreamOutcome::Cancelled => handler.cancelled(),
        // on_error already reported the failure
        StreamOutcome::Failed(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::models::MessageError;
    use crate::store::{ChatStoreOptions, StoreMessage};
    use crate::traits::HttpError;

    const ENDPOINT: &str = "http://test/chat";

    fn store(mock: &MockHttpClient) -> ChatStore {
        ChatStore::new(StreamTransport::new(Arc::new(mock.clone())), ENDPOINT)
    }

    fn frame(event: &str, data: &str) -> String {
        format!("event: {}\ndata: {}\n\n", event, data)
    }

    fn full_turn(text: &str) -> Vec<String> {
        vec![
            frame("message_start", r#"{"conv_id":"c1","msg_id":"m1"}"#),
            frame("message", &format!(r#"{{"content":"{}","sequence":1}}"#, text)),
            frame("message_end", r#"{"conv_id":"c1","msg_id":"m1"}"#),
        ]
    }

    #[tokio::test]
    async fn test_submit_appends_user_and_stub() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Hang);
        let mut store = store(&mock);

        assert!(store.handle_submit(Some("hello".to_string()), None));

        let items = &store.state().items;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].role, MessageRole::User);
        assert_eq!(items[0].text(), "hello");
        assert_eq!(items[0].parent_id, None);
        assert_eq!(items[1].role, MessageRole::Assistant);
        assert_eq!(items[1].parent_id.as_deref(), Some(items[0].id.as_str()));
        assert_eq!(items[1].text(), "");
        assert_eq!(store.status(), ChatStatus::Streaming);

        store.handle_cancel();
    }

    #[tokio::test]
    async fn test_submit_uses_input_and_clears_it() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::sse(full_turn("hi")));
        let mut store = store(&mock);
        store.set_input("from input");

        assert!(store.handle_submit(Some("   ".to_string()), None));
        assert_eq!(store.state().items[0].text(), "from input");
        assert!(store.state().input.is_empty());
        store.settle().await;
    }

    #[tokio::test]
    async fn test_submit_rejects_blank_and_disabled() {
        let mock = MockHttpClient::new();
        let mut store = store(&mock);
        store.set_input("  \n ");

        assert!(!store.handle_submit(None, None));
        store.set_enabled(false);
        assert!(!store.handle_submit(Some("hello".to_string()), None));

        assert!(store.state().items.is_empty());
        assert_eq!(store.status(), ChatStatus::Idle);
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_single_flight() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Hang);
        let mut store = store(&mock);

        assert!(store.handle_submit(Some("one".to_string()), None));
        assert!(!store.handle_submit(Some("two".to_string()), None));
        assert_eq!(store.state().items.len(), 2);

        store.handle_cancel();
    }

    #[tokio::test]
    async fn test_full_turn_reaches_success() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::sse(full_turn("Hello")));
        let mut store = store(&mock);

        store.handle_submit(Some("hi".to_string()), None);
        store.settle().await;

        assert_eq!(store.status(), ChatStatus::Success);
        assert_eq!(store.state().items[1].text(), "Hello");
        assert!(!store.is_in_flight());
        assert_eq!(store.state().thread_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_message_end_content_replaces_text() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::sse([
            frame("message", r#"{"content":"draft","sequence":1}"#),
            frame("message_end", r#"{"conv_id":"c1","msg_id":"m1","content":"final"}"#),
        ]));
        let mut store = store(&mock);

        store.handle_submit(Some("hi".to_string()), None);
        store.settle().await;

        assert_eq!(store.status(), ChatStatus::Success);
        assert_eq!(store.state().items[1].text(), "final");
    }

    #[tokio::test]
    async fn test_request_history_and_thread() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::sse(full_turn("ok")));
        let mut store = store(&mock).with_thread_id(Some("t9".to_string()));

        store.handle_submit(Some("first".to_string()), None);
        store.settle().await;
        store.handle_submit(Some("second".to_string()), None);
        store.settle().await;

        let requests = mock.get_requests();
        assert_eq!(requests.len(), 2);
        let body = requests[1].json().unwrap();
        assert_eq!(body["id"], "t9");
        let messages = body["messages"].as_array().unwrap();
        // first, its reply, second; the new stub is not sent
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2]["content"], "second");
        assert_eq!(
            store.state().items[2].parent_id.as_deref(),
            Some(store.state().items[1].id.as_str())
        );
    }

    #[tokio::test]
    async fn test_request_transform() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::sse(full_turn("ok")));
        let options = ChatStoreOptions {
            request_transform: Some(Arc::new(|messages: &[ChatMessage], thread_id: Option<&str>| {
                serde_json::json!({
                    "count": messages.len(),
                    "thread": thread_id,
                })
            })),
            ..Default::default()
        };
        let mut store = store(&mock).with_options(options);

        store.handle_submit(Some("hi".to_string()), None);
        store.settle().await;

        let body = mock.get_requests()[0].json().unwrap();
        assert_eq!(body, serde_json::json!({"count": 1, "thread": null}));
    }

    #[tokio::test]
    async fn test_http_error_marks_message() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Error(HttpError::ServerError {
            status: 500,
            message: "boom".to_string(),
        }));
        let mut store = store(&mock);

        store.handle_submit(Some("hi".to_string()), None);
        store.settle().await;

        assert_eq!(store.status(), ChatStatus::Error);
        let error = store.state().items[1].error.as_ref().unwrap();
        assert_eq!(error.code, "E_NET_HTTP");
        assert!(error.retryable);
    }

    #[tokio::test]
    async fn test_retry_sends_full_history() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::sse(full_turn("ok")));
        let mut store = store(&mock);

        store.handle_submit(Some("first".to_string()), None);
        store.settle().await;
        store.handle_submit(Some("second".to_string()), None);
        store.settle().await;
        assert_eq!(store.state().items.len(), 4);

        let first_reply = store.state().items[1].id.clone();
        assert!(store.handle_retry(&first_reply, None));
        store.settle().await;

        let requests = mock.get_requests();
        assert_eq!(requests.len(), 3);
        let body = requests[2].json().unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["content"], "first");
        assert_eq!(messages[1]["id"], first_reply.as_str());
        assert_eq!(messages[1]["content"], "");
        assert_eq!(messages[2]["content"], "second");
        assert_eq!(messages[3]["content"], "ok");
    }

    #[test]
    fn test_submit_without_runtime_fails_turn() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::sse(full_turn("ok")));
        let mut store = store(&mock);

        assert!(store.handle_submit(Some("hi".to_string()), None));

        assert_eq!(store.status(), ChatStatus::Error);
        assert!(!store.is_in_flight());
        let error = store.state().items[1].error.clone().unwrap();
        assert_eq!(error.code, "E_STREAM_OTHER");
        assert!(error.message.contains("no async runtime"));
        assert_eq!(mock.request_count(), 0);

        let reply_id = store.state().items[1].id.clone();
        assert!(store.handle_retry(&reply_id, None));
        assert_eq!(store.status(), ChatStatus::Error);
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_retry_clears_error_and_streams_again() {
        let mock = MockHttpClient::new();
        mock.push_response(MockResponse::Error(HttpError::ServerError {
            status: 502,
            message: "bad gateway".to_string(),
        }));
        mock.push_response(MockResponse::sse(full_turn("recovered")));
        let mut store = store(&mock);

        store.handle_submit(Some("hi".to_string()), None);
        store.settle().await;
        assert_eq!(store.status(), ChatStatus::Error);

        let assistant_id = store.state().items[1].id.clone();
        assert!(store.handle_retry(&assistant_id, None));
        assert!(store.state().items[1].error.is_none());
        assert_eq!(store.state().items[1].text(), "");
        assert_eq!(store.status(), ChatStatus::Streaming);
        store.settle().await;

        assert_eq!(store.status(), ChatStatus::Success);
        assert_eq!(store.state().items.len(), 2);
        assert_eq!(store.state().items[1].text(), "recovered");
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test]
    async fn test_retry_user_message_reuses_reply() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::sse(full_turn("again")));
        let mut store = store(&mock);

        store.handle_submit(Some("hi".to_string()), None);
        store.settle().await;

        let user_id = store.state().items[0].id.clone();
        assert!(store.handle_retry(&user_id, None));
        store.settle().await;

        assert_eq!(store.state().items.len(), 2);
        assert_eq!(store.state().items[1].text(), "again");
    }

    #[tokio::test]
    async fn test_retry_user_message_without_reply_inserts_stub() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::sse(full_turn("new")));
        let mut store = store(&mock);
        let user = ChatMessage::user("orphan");
        let user_id = user.id.clone();
        store.push_message(user);

        assert!(store.handle_retry(&user_id, None));
        store.settle().await;

        let items = &store.state().items;
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].parent_id.as_deref(), Some(user_id.as_str()));
        assert_eq!(items[1].text(), "new");
    }

    #[tokio::test]
    async fn test_retry_rejected_cases() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Hang);
        let mut store = store(&mock);

        assert!(!store.handle_retry("missing", None));

        store.handle_submit(Some("hi".to_string()), None);
        let id = store.state().items[1].id.clone();
        assert!(!store.handle_retry(&id, None));
        store.handle_cancel();

        store.set_enabled(false);
        assert!(!store.handle_retry(&id, None));
    }

    #[tokio::test]
    async fn test_custom_retry_handler() {
        let mock = MockHttpClient::new();
        let mut store = store(&mock);
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();

        let handled = store.handle_retry(
            "any-id",
            Some(Box::new(move |id: &str| {
                *sink.lock().unwrap() = Some(id.to_string())
            })),
        );

        assert!(handled);
        assert_eq!(seen.lock().unwrap().as_deref(), Some("any-id"));
        assert_eq!(mock.request_count(), 0);
        assert_eq!(store.status(), ChatStatus::Idle);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::StreamThenHang(vec![bytes::Bytes::from(
            frame("message", r#"{"content":"partial","sequence":1}"#),
        )]));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let options = ChatStoreOptions {
            on_cancel: Some(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
            ..Default::default()
        };
        let mut store = store(&mock).with_options(options);

        store.handle_submit(Some("hi".to_string()), None);
        store.handle_cancel();
        store.handle_cancel();
        store.settle().await;

        assert_eq!(store.status(), ChatStatus::Idle);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!store.is_in_flight());
        assert!(store.state().items[1].error.is_none());
    }

    #[tokio::test]
    async fn test_cancel_without_turn() {
        let mock = MockHttpClient::new();
        let mut store = store(&mock);
        store.handle_cancel();
        assert_eq!(store.status(), ChatStatus::Idle);
    }

    #[tokio::test]
    async fn test_stale_turn_messages_are_ignored() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Hang);
        let mut store = store(&mock);
        store.handle_submit(Some("hi".to_string()), None);
        let id = store.state().items[1].id.clone();

        store.handle_message(StoreMessage::TextUpdated {
            turn: 0,
            message_id: id.clone(),
            content: "stale".to_string(),
        });
        store.handle_message(StoreMessage::TurnFailed {
            turn: 0,
            message_id: id.clone(),
            error: MessageError {
                code: "E_STREAM_CONN".to_string(),
                message: "lost".to_string(),
                retryable: true,
                hint: None,
            },
        });

        assert_eq!(store.state().items[1].text(), "");
        assert_eq!(store.status(), ChatStatus::Streaming);
        assert!(store.is_in_flight());

        store.handle_cancel();
    }

    #[tokio::test]
    async fn test_late_text_after_cancel_is_dropped() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Hang);
        let mut store = store(&mock);
        store.handle_submit(Some("hi".to_string()), None);
        let id = store.state().items[1].id.clone();
        store.handle_cancel();

        store.handle_message(StoreMessage::TextUpdated {
            turn: 1,
            message_id: id,
            content: "late".to_string(),
        });
        assert_eq!(store.state().items[1].text(), "");
        assert_eq!(store.status(), ChatStatus::Idle);
    }

    #[tokio::test]
    async fn test_thread_adopted_from_message_start() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Hang);
        let mut store = store(&mock);
        store.handle_submit(Some("hi".to_string()), None);
        let id = store.state().items[1].id.clone();

        store.handle_message(StoreMessage::MessageStarted {
            turn: 1,
            message_id: id,
            conv_id: "conv-7".to_string(),
        });

        assert_eq!(store.state().thread_id.as_deref(), Some("conv-7"));
        assert!(store
            .state()
            .items
            .iter()
            .all(|m| m.thread_id.as_deref() == Some("conv-7")));

        store.handle_cancel();
    }

    #[tokio::test]
    async fn test_reasoning_recorded() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::sse([
            frame("thinking", r#"{"content":"Let me ","sequence":1}"#),
            frame("thinking", r#"{"content":"think","sequence":2}"#),
            frame("message", r#"{"content":"Answer","sequence":3}"#),
            frame("message_end", r#"{"conv_id":"c","msg_id":"m"}"#),
        ]));
        let mut store = store(&mock);

        store.handle_submit(Some("why?".to_string()), None);
        store.settle().await;

        let reasoning = store.state().items[1].reasoning.as_ref().unwrap();
        assert_eq!(reasoning.content, "Let me think");
        assert!(reasoning.duration.is_some());
        assert_eq!(store.state().items[1].text(), "Answer");
    }

    #[tokio::test]
    async fn test_stream_closed_without_end_is_success() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::sse([frame(
            "message",
            r#"{"content":"cut","sequence":1}"#,
        )]));
        let mut store = store(&mock);

        store.handle_submit(Some("hi".to_string()), None);
        store.settle().await;

        assert_eq!(store.status(), ChatStatus::Success);
        assert_eq!(store.state().items[1].text(), "cut");
    }
}
