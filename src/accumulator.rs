//! Running text and reasoning buffers for one stream.
//!
//! A fresh [`StreamAccumulator`] is created for every processed stream, so
//! nothing carries over between turns.
//!
//! Each `message` event's `content` is appended to the running text and the
//! callback receives the full concatenation. If the backend ever sends
//! cumulative snapshots instead of deltas this will double the text; the
//! behaviour is kept as observed against the current backend.

use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct StreamAccumulator {
    text: String,
    reasoning: String,
    reasoning_started: Option<Instant>,
    reasoning_duration: Option<Duration>,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message delta and return the text accumulated so far.
    pub fn push_text(&mut self, content: &str) -> &str {
        self.text.push_str(content);
        &self.text
    }

    /// Append a thinking delta and return the reasoning accumulated so far.
    pub fn push_reasoning(&mut self, content: &str) -> &str {
        if self.reasoning_started.is_none() {
            self.reasoning_started = Some(Instant::now());
        }
        self.reasoning.push_str(content);
        &self.reasoning
    }

    /// Close an open reasoning phase. Returns its duration the first time it
    /// is closed, `None` if there was no phase or it was already closed.
    pub fn finish_reasoning(&mut self) -> Option<Duration> {
        if self.reasoning_duration.is_some() {
            return None;
        }
        let started = self.reasoning_started?;
        let elapsed = started.elapsed();
        self.reasoning_duration = Some(elapsed);
        Some(elapsed)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn reasoning_duration(&self) -> Option<Duration> {
        self.reasoning_duration
    }

    /// Whether a reasoning phase started and has not been closed.
    pub fn reasoning_open(&self) -> bool {
        self.reasoning_started.is_some() && self.reasoning_duration.is_none()
    }
}
