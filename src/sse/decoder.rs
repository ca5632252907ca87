//! Event frame decoder
//!
//! Splits the raw response body into frame strings. The framing is detected
//! once, from the first non-blank text of the stream:
//!
//! ```text
//! Undetected --first line starts with event:/data:/:--> ServerSentEvents(delimiter)
//! Undetected --anything else-------------------------> Unknown
//! ```
//!
//! The delimiter (`\n\n` or `\r\n\r\n`) follows the line ending of that first
//! line and is never re-detected. The last split segment of every chunk is
//! held back until the next delimiter arrives.

use crate::error::StreamError;

/// Frame delimiter of an SSE stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `\n\n`
    Lf,
    /// `\r\n\r\n`
    CrLf,
}

impl Delimiter {
    pub fn as_str(self) -> &'static str {
        match self {
            Delimiter::Lf => "\n\n",
            Delimiter::CrLf => "\r\n\r\n",
        }
    }
}

/// Detection state of the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    /// Nothing but whitespace (or an incomplete first line) seen yet.
    Undetected,
    /// Newline-delimited SSE with a fixed frame delimiter.
    ServerSentEvents(Delimiter),
    /// Not an SSE stream. Terminal.
    Unknown,
}

const SSE_PREFIXES: [&str; 3] = [":", "event:", "data:"];

/// Decide the format from the text seen so far. `None` means more input is
/// needed before a decision can be made.
fn detect(text: &str, at_end: bool) -> Option<StreamFormat> {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return None;
    }

    if !SSE_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
        // "ev" might still become "event:".
        let could_become_sse = SSE_PREFIXES[1..].iter().any(|p| p.starts_with(trimmed));
        return if could_become_sse && !at_end {
            None
        } else {
            Some(StreamFormat::Unknown)
        };
    }

    match trimmed.find('\n') {
        Some(nl) if trimmed[..nl].ends_with('\r') => {
            Some(StreamFormat::ServerSentEvents(Delimiter::CrLf))
        }
        Some(_) => Some(StreamFormat::ServerSentEvents(Delimiter::Lf)),
        None if at_end => Some(StreamFormat::ServerSentEvents(Delimiter::Lf)),
        None => None,
    }
}

/// Stateful splitter from body chunks to frames.
#[derive(Debug)]
pub struct FrameDecoder {
    format: StreamFormat,
    /// Decoded text not yet emitted as a frame
    buffer: String,
    /// Trailing bytes of an incomplete UTF-8 sequence
    pending: Vec<u8>,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            format: StreamFormat::Undetected,
            buffer: String::new(),
            pending: Vec::new(),
        }
    }

    /// Current detection state.
    pub fn format(&self) -> StreamFormat {
        self.format
    }

    /// Feed one body chunk, returning every frame it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<String>, StreamError> {
        if self.format == StreamFormat::Unknown {
            return Err(StreamError::unknown_format(&self.buffer));
        }

        let text = self.decode_utf8(chunk);
        self.buffer.push_str(&text);

        if self.format == StreamFormat::Undetected {
            match detect(&self.buffer, false) {
                None => return Ok(Vec::new()),
                Some(format) => self.set_format(format),
            }
        }

        match self.format {
            StreamFormat::ServerSentEvents(delimiter) => Ok(self.split_frames(delimiter)),
            _ => Err(StreamError::unknown_format(&self.buffer)),
        }
    }

    /// Flush at end of stream. Returns the trailing frame, if the body did
    /// not end with a delimiter.
    pub fn finish(&mut self) -> Result<Option<String>, StreamError> {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.buffer.push_str(&String::from_utf8_lossy(&rest));
        }

        if self.format == StreamFormat::Undetected {
            match detect(&self.buffer, true) {
                None => return Ok(None),
                Some(format) => self.set_format(format),
            }
        }

        match self.format {
            StreamFormat::ServerSentEvents(_) => {
                let rest = std::mem::take(&mut self.buffer);
                if rest.trim().is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(rest))
                }
            }
            _ => Err(StreamError::unknown_format(&self.buffer)),
        }
    }

    fn set_format(&mut self, format: StreamFormat) {
        match format {
            StreamFormat::ServerSentEvents(delimiter) => {
                tracing::debug!(?delimiter, "Detected SSE stream");
                let leading = self.buffer.len() - self.buffer.trim_start().len();
                self.buffer.drain(..leading);
            }
            StreamFormat::Unknown => {
                tracing::error!(
                    preview = %self.buffer.chars().take(64).collect::<String>(),
                    "Response body is not an SSE stream"
                );
            }
            StreamFormat::Undetected => {}
        }
        self.format = format;
    }

    fn split_frames(&mut self, delimiter: Delimiter) -> Vec<String> {
        let delim = delimiter.as_str();
        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.find(delim) {
            let frame: String = self.buffer.drain(..pos + delim.len()).collect();
            let frame = &frame[..pos];
            if !frame.trim().is_empty() {
                frames.push(frame.to_string());
            }
        }
        frames
    }

    /// Decode as much of `pending + chunk` as forms complete UTF-8, keeping
    /// an incomplete trailing sequence for the next chunk. Invalid bytes are
    /// replaced with U+FFFD.
    fn decode_utf8(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest: &[u8] = &bytes;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }
        self.pending = rest.to_vec();
        out
    }
}
