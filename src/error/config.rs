//! Configuration error types.

use thiserror::Error;

/// Problems with [`crate::config::ChatConfig`] values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// No endpoint was configured.
    #[error("no chat endpoint configured (set DONKIN_ENDPOINT or pass --endpoint)")]
    MissingEndpoint,

    /// The endpoint is not an absolute http(s) URL.
    #[error("invalid chat endpoint '{0}': expected an http:// or https:// URL")]
    InvalidEndpoint(String),

    /// An environment variable or flag held an unparseable value.
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

impl ConfigError {
    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::MissingEndpoint => "E_CFG_ENDPOINT",
            ConfigError::InvalidEndpoint(_) => "E_CFG_URL",
            ConfigError::InvalidValue { .. } => "E_CFG_VALUE",
        }
    }
}
