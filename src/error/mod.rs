//! Unified error handling for the chat pipeline.
//!
//! - **Error Categories**: high-level classification for handling decisions
//! - **Domain-specific Errors**: Network, Stream and Config errors
//! - **Unified Error Type**: `ChatError` consolidates all error types
//! - **Error Context**: debugging information attached to errors
//! - **Result Type Alias**: `ChatResult<T>`
//!
//! Errors never cross the store boundary. A failed turn is recorded on the
//! assistant message as a [`crate::models::MessageError`] built from the
//! `ChatError`.
//!
//! | Category | Description | Retryable |
//! |----------|-------------|-----------|
//! | Network | Connection, timeout, lost stream | Yes |
//! | Auth | HTTP 401/403 | No |
//! | Server | 5xx, backend `error` events | Yes |
//! | Client | Unreadable stream format | No |
//! | Configuration | Endpoint/token settings | No |

mod category;
mod chat_error;
mod config;
mod context;
mod network;
mod result;
mod stream;

pub use category::ErrorCategory;
pub use chat_error::ChatError;
pub use config::ConfigError;
pub use context::ErrorContext;
pub use network::NetworkError;
pub use result::{ChatResult, ResultExt};
pub use stream::StreamError;
