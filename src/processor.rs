//! Reader loop for one turn: bytes -> frames -> events -> handler callbacks.
//!
//! Frame-level problems are logged, reported through
//! [`StreamHandler::on_frame_skipped`] and skipped. Stream-level problems
//! (unknown format, a failed read, a backend `error` event) end the turn with
//! [`StreamOutcome::Failed`]. Cancellation is an outcome, not an error.

use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::accumulator::StreamAccumulator;
use crate::error::{ChatError, StreamError};
use crate::sse::{interpret_frame, ChatStreamEvent, FrameDecoder, MessageEnd, ParsedEvent};
use crate::traits::{HttpError, StreamHandler};

/// What a finished stream produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnSummary {
    /// Accumulated text, or the `message_end` content when one was sent
    pub text: String,
    pub reasoning: String,
    pub reasoning_duration: Option<Duration>,
    /// Whether a `message_end` event was received
    pub completed: bool,
    /// Frames interpreted, including heartbeats
    pub frames: usize,
    /// Frames skipped as malformed
    pub skipped: usize,
}

/// How the reader loop ended.
#[derive(Debug)]
pub enum StreamOutcome {
    Finished(TurnSummary),
    Cancelled,
    Failed(ChatError),
}

impl StreamOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StreamOutcome::Cancelled)
    }
}

#[derive(Default)]
struct TurnProgress {
    acc: StreamAccumulator,
    end: Option<MessageEnd>,
    frames: usize,
    skipped: usize,
}

impl TurnProgress {
    /// Interpret and dispatch one frame. Returns an error only when the turn
    /// must stop.
    fn handle_frame<H>(&mut self, frame: &str, handler: &mut H) -> Result<(), ChatError>
    where
        H: StreamHandler + ?Sized,
    {
        let parsed = match interpret_frame(frame) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.skipped += 1;
                tracing::warn!(error = %e, "Skipping malformed frame");
                handler.on_frame_skipped(&e);
                return Ok(());
            }
        };
        self.frames += 1;

        if let ParsedEvent::BestEffort(partial) = &parsed {
            tracing::warn!(event = partial.name(), "Using best-effort event");
        }

        match parsed.into_event() {
            ChatStreamEvent::Heartbeat => {
                tracing::trace!("Heartbeat");
            }
            ChatStreamEvent::MessageStart(start) => {
                tracing::debug!(conv_id = %start.conv_id, msg_id = %start.msg_id, "Message started");
                handler.on_message_start(&start);
            }
            ChatStreamEvent::Thinking(delta) => {
                let reasoning = self.acc.push_reasoning(&delta.content);
                handler.on_thinking(reasoning);
            }
            ChatStreamEvent::Message(delta) => {
                self.close_reasoning(handler);
                let text = self.acc.push_text(&delta.content);
                handler.on_text_part(text);
            }
            ChatStreamEvent::MessageEnd(end) => {
                self.close_reasoning(handler);
                tracing::debug!(msg_id = %end.msg_id, "Message ended");
                handler.on_message_end(&end);
                self.end = Some(end);
            }
            ChatStreamEvent::Error(failure) => {
                return Err(StreamError::BackendError {
                    code: failure.code,
                    message: failure.message,
                }
                .into());
            }
        }
        Ok(())
    }

    fn close_reasoning<H>(&mut self, handler: &mut H)
    where
        H: StreamHandler + ?Sized,
    {
        if let Some(duration) = self.acc.finish_reasoning() {
            handler.on_reasoning_done(duration);
        }
    }

    fn into_summary(self) -> TurnSummary {
        let completed = self.end.is_some();
        let text = self
            .end
            .and_then(|end| end.content)
            .unwrap_or_else(|| self.acc.text().to_string());
        TurnSummary {
            text,
            reasoning: self.acc.reasoning().to_string(),
            reasoning_duration: self.acc.reasoning_duration(),
            completed,
            frames: self.frames,
            skipped: self.skipped,
        }
    }
}

fn fail<H>(handler: &mut H, error: ChatError) -> StreamOutcome
where
    H: StreamHandler + ?Sized,
{
    tracing::error!(code = error.error_code(), error = %error, "Stream failed");
    handler.on_error(&error);
    StreamOutcome::Failed(error)
}

/// Consume `stream` until it ends, fails, or `cancel` fires.
///
/// Events are dispatched strictly in arrival order. The stream is dropped
/// (and its reader released) before this returns, whatever the outcome.
/// Reading continues after `message_end` until the server closes the body.
pub async fn process_stream_events<S, H>(
    stream: S,
    handler: &mut H,
    cancel: &CancellationToken,
) -> StreamOutcome
where
    S: Stream<Item = Result<Bytes, HttpError>> + Unpin,
    H: StreamHandler + ?Sized,
{
    let mut stream = stream;
    let mut decoder = FrameDecoder::new();
    let mut progress = TurnProgress::default();

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::info!("Stream cancelled");
                return StreamOutcome::Cancelled;
            }
            next = stream.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                let frames = match decoder.feed(&chunk) {
                    Ok(frames) => frames,
                    Err(e) => return fail(handler, e.into()),
                };
                for frame in frames {
                    if let Err(e) = progress.handle_frame(&frame, handler) {
                        return fail(handler, e);
                    }
                }
            }
            Some(Err(e)) => {
                // Aborting a read surfaces as an error from some clients.
                if cancel.is_cancelled() {
                    tracing::info!("Stream cancelled during read");
                    return StreamOutcome::Cancelled;
                }
                let error = StreamError::ConnectionLost {
                    message: e.to_string(),
                };
                return fail(handler, error.into());
            }
            None => break,
        }
    }
    drop(stream);

    match decoder.finish() {
        Ok(Some(frame)) => {
            if let Err(e) = progress.handle_frame(&frame, handler) {
                return fail(handler, e);
            }
        }
        Ok(None) => {}
        Err(e) => return fail(handler, e.into()),
    }
    progress.close_reasoning(handler);

    if progress.end.is_none() {
        tracing::warn!("Stream closed without message_end");
    }
    StreamOutcome::Finished(progress.into_summary())
}
