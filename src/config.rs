//! Runtime configuration for the chat client.

use std::time::Duration;

use crate::error::ConfigError;

pub const ENV_ENDPOINT: &str = "DONKIN_ENDPOINT";
pub const ENV_THREAD_ID: &str = "DONKIN_THREAD_ID";
pub const ENV_TOKEN: &str = "DONKIN_TOKEN";
pub const ENV_CONNECT_TIMEOUT: &str = "DONKIN_CONNECT_TIMEOUT_SECS";
pub const ENV_DISABLED: &str = "DONKIN_DISABLED";

/// Default connect timeout. Reads have no timeout; a reply may stream for
/// as long as the backend keeps the connection open.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for a chat session.
///
/// # Example
///
/// ```ignore
/// use donkin::config::ChatConfig;
///
/// let config = ChatConfig::from_env()?
///     .with_endpoint("http://localhost:8000/chat")
///     .with_thread_id(Some("thread-1".to_string()));
/// config.validate()?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// URL the chat request is POSTed to
    pub endpoint: Option<String>,
    /// Thread to continue; `None` lets the backend start one
    pub thread_id: Option<String>,
    /// Bearer token sent with each request
    pub auth_token: Option<String>,
    pub connect_timeout: Duration,
    /// When false, submit and retry are ignored
    pub enabled: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            thread_id: None,
            auth_token: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            enabled: true,
        }
    }
}

impl ChatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_thread_id(mut self, thread_id: Option<String>) -> Self {
        self.thread_id = thread_id;
        self
    }

    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Defaults overridden by `DONKIN_*` environment variables.
    ///
    /// Empty variables are treated as unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(endpoint) = env_var(ENV_ENDPOINT) {
            config.endpoint = Some(endpoint);
        }
        config.thread_id = env_var(ENV_THREAD_ID);
        config.auth_token = env_var(ENV_TOKEN);

        if let Some(raw) = env_var(ENV_CONNECT_TIMEOUT) {
            let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_CONNECT_TIMEOUT.to_string(),
                value: raw.clone(),
            })?;
            config.connect_timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = env_var(ENV_DISABLED) {
            config.enabled = !parse_flag(ENV_DISABLED, &raw)?;
        }

        Ok(config)
    }

    /// Check the endpoint is present and an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or(ConfigError::MissingEndpoint)?;

        let rest = endpoint
            .strip_prefix("http://")
            .or_else(|| endpoint.strip_prefix("https://"))
            .ok_or_else(|| ConfigError::InvalidEndpoint(endpoint.to_string()))?;
        let host = rest.split(['/', '?', '#']).next().unwrap_or("");
        if host.is_empty() || rest.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidEndpoint(endpoint.to_string()));
        }
        Ok(())
    }

    /// The validated endpoint.
    pub fn endpoint(&self) -> Result<&str, ConfigError> {
        self.validate()?;
        self.endpoint.as_deref().ok_or(ConfigError::MissingEndpoint)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}
