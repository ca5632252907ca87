//! Tracing subscriber setup for the binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the log filter, e.g. `donkin=debug`.
pub const LOG_ENV: &str = "DONKIN_LOG";

pub const DEFAULT_FILTER: &str = "warn";

/// Filter from `DONKIN_LOG`, falling back to [`DEFAULT_FILTER`] when the
/// variable is unset or unparseable.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Logs go to stderr so stdout carries only
/// the streamed reply. Does nothing if a subscriber is already set.
pub fn init() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .try_init();
}
