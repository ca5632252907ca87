//! Callbacks driven by the stream processor.
//!
//! The processor owns the decoder, interpreter and accumulator for one turn
//! and reports progress through a [`StreamHandler`]. The store implements it
//! by forwarding [`crate::store::StoreMessage`]s over its channel; tests
//! implement it with a recorder.

use std::time::Duration;

use crate::error::ChatError;
use crate::sse::{MessageEnd, MessageStart, SseParseError};

/// Receiver of interpreted stream events for a single turn.
///
/// Text and reasoning callbacks always receive the full accumulated value,
/// never a delta.
pub trait StreamHandler: Send {
    /// The backend announced the assistant message.
    fn on_message_start(&mut self, start: &MessageStart);

    /// Reasoning trace grew. `accumulated` is everything received so far.
    fn on_thinking(&mut self, accumulated: &str);

    /// The reasoning phase ended after `duration`.
    fn on_reasoning_done(&mut self, duration: Duration);

    /// Message text grew. `accumulated` is everything received so far.
    fn on_text_part(&mut self, accumulated: &str);

    /// Terminal event for the assistant turn.
    fn on_message_end(&mut self, end: &MessageEnd);

    /// The turn failed.
    fn on_error(&mut self, error: &ChatError);

    /// A frame was skipped. Frame-level problems never end the turn.
    fn on_frame_skipped(&mut self, _error: &SseParseError) {}
}
