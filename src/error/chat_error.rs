//! Unified error type for the chat pipeline.
//!
//! `ChatError` consolidates the domain errors so the store can categorize a
//! failed turn and render it on the assistant message.

use std::fmt;

use super::category::ErrorCategory;
use super::config::ConfigError;
use super::context::ErrorContext;
use super::network::NetworkError;
use super::stream::StreamError;

/// Unified error type for the chat pipeline.
#[derive(Debug)]
pub enum ChatError {
    /// Network-related errors (connections, HTTP, timeouts).
    Network(NetworkError),

    /// Stream/SSE processing errors.
    Stream(StreamError),

    /// Configuration errors.
    Config(ConfigError),

    /// Wrapped error with additional context.
    WithContext {
        error: Box<ChatError>,
        context: ErrorContext,
    },
}

impl ChatError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ChatError::Network(err) => {
                if err.is_auth_failure() {
                    ErrorCategory::Auth
                } else if let NetworkError::HttpStatus { status: 500..=599, .. } = err {
                    ErrorCategory::Server
                } else if let NetworkError::InvalidUrl { .. } = err {
                    ErrorCategory::Configuration
                } else {
                    ErrorCategory::Network
                }
            }
            ChatError::Stream(err) => match err {
                StreamError::ConnectionLost { .. } => ErrorCategory::Network,
                StreamError::BackendError { .. } => ErrorCategory::Server,
                StreamError::UnknownFormat { .. } | StreamError::InvalidJson { .. } => {
                    ErrorCategory::Client
                }
                StreamError::Other { .. } => ErrorCategory::Server,
            },
            ChatError::Config(_) => ErrorCategory::Configuration,
            ChatError::WithContext { error, .. } => error.category(),
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChatError::Network(err) => err.is_retryable(),
            ChatError::Stream(err) => err.is_retryable(),
            ChatError::Config(_) => false,
            ChatError::WithContext { error, .. } => error.is_retryable(),
        }
    }

    /// Whether this error only records that the turn was cancelled.
    pub fn is_cancellation(&self) -> bool {
        matches!(self.inner(), ChatError::Network(NetworkError::Cancelled))
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Network(err) => err.user_message(),
            ChatError::Stream(err) => err.user_message(),
            ChatError::Config(err) => err.to_string(),
            ChatError::WithContext { error, .. } => error.user_message(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ChatError::Network(err) => err.error_code(),
            ChatError::Stream(err) => err.error_code(),
            ChatError::Config(err) => err.error_code(),
            ChatError::WithContext { error, .. } => error.error_code(),
        }
    }

    /// Attach context to this error.
    pub fn with_context(self, ctx: ErrorContext) -> Self {
        ChatError::WithContext {
            error: Box::new(self),
            context: ctx,
        }
    }

    /// Get the context if this error has one attached.
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            ChatError::WithContext { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Get the inner error without context.
    pub fn inner(&self) -> &ChatError {
        match self {
            ChatError::WithContext { error, .. } => error.inner(),
            _ => self,
        }
    }

    /// Get the recovery hint for this error.
    pub fn recovery_hint(&self) -> &'static str {
        self.category().recovery_hint()
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::Network(err) => write!(f, "{}", err),
            ChatError::Stream(err) => write!(f, "{}", err),
            ChatError::Config(err) => write!(f, "{}", err),
            ChatError::WithContext { error, context } => {
                write!(f, "{} ({})", error, context)
            }
        }
    }
}

impl std::error::Error for ChatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChatError::Network(err) => Some(err),
            ChatError::Stream(err) => Some(err),
            ChatError::Config(err) => Some(err),
            ChatError::WithContext { error, .. } => error.source(),
        }
    }
}

impl From<NetworkError> for ChatError {
    fn from(err: NetworkError) -> Self {
        ChatError::Network(err)
    }
}

impl From<StreamError> for ChatError {
    fn from(err: StreamError) -> Self {
        ChatError::Stream(err)
    }
}

impl From<ConfigError> for ChatError {
    fn from(err: ConfigError) -> Self {
        ChatError::Config(err)
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Stream(StreamError::InvalidJson {
            event_type: "unknown".to_string(),
            message: err.to_string(),
        })
    }
}
