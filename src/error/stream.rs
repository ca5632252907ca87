//! Streaming-related error types.
//!
//! Turn-level failures of the SSE pipeline. Frame-level problems are
//! [`crate::sse::SseParseError`] and never end a turn on their own.

use std::fmt;

/// Stream-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamError {
    /// The response body is not shaped like an SSE stream.
    UnknownFormat {
        preview: String,
    },

    /// The byte stream failed mid-read.
    ConnectionLost {
        message: String,
    },

    /// Invalid JSON in a frame whose failure is fatal.
    InvalidJson {
        event_type: String,
        message: String,
    },

    /// Backend reported an error via an `error` event.
    BackendError {
        code: Option<String>,
        message: String,
    },

    /// Generic stream error.
    Other {
        message: String,
    },
}

impl StreamError {
    /// Build an [`StreamError::UnknownFormat`] from the first bytes seen.
    pub fn unknown_format(text: &str) -> Self {
        let preview: String = text.chars().take(64).collect();
        StreamError::UnknownFormat { preview }
    }

    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StreamError::ConnectionLost { .. } | StreamError::BackendError { .. }
        )
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::UnknownFormat { .. } => {
                "The assistant replied in a format this client does not understand.".to_string()
            }
            StreamError::ConnectionLost { .. } => {
                "Connection to the assistant was lost before the reply finished.".to_string()
            }
            StreamError::InvalidJson { .. } => {
                "Received invalid data from the assistant. Please try again.".to_string()
            }
            StreamError::BackendError { message, .. } => format!("Assistant error: {}", message),
            StreamError::Other { message } => format!("Stream error: {}", message),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::UnknownFormat { .. } => "E_STREAM_FORMAT",
            StreamError::ConnectionLost { .. } => "E_STREAM_CONN",
            StreamError::InvalidJson { .. } => "E_STREAM_JSON",
            StreamError::BackendError { .. } => "E_STREAM_BACKEND",
            StreamError::Other { .. } => "E_STREAM_OTHER",
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::UnknownFormat { preview } => {
                write!(f, "Unknown stream format (starts with {:?})", preview)
            }
            StreamError::ConnectionLost { message } => {
                write!(f, "Stream connection lost: {}", message)
            }
            StreamError::InvalidJson { event_type, message } => {
                write!(f, "Invalid JSON for {} event: {}", event_type, message)
            }
            StreamError::BackendError { code, message } => match code {
                Some(c) => write!(f, "Backend error [{}]: {}", c, message),
                None => write!(f, "Backend error: {}", message),
            },
            StreamError::Other { message } => write!(f, "Stream error: {}", message),
        }
    }
}

impl std::error::Error for StreamError {}
