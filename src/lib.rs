//! Donkin - streaming chat client and conversation store
//!
//! Reads a chat backend's server-sent event stream, turns it into typed
//! events, and applies them to an observable transcript.
//!
//! This library exposes modules for use by the binary and integration tests.

pub mod accumulator;
pub mod adapters;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod processor;
pub mod sse;
pub mod store;
pub mod telemetry;
pub mod traits;
pub mod transport;

pub use config::ChatConfig;
pub use error::{ChatError, ChatResult};
pub use store::{ChatState, ChatStatus, ChatStore, ChatStoreOptions, StoreMessage};
pub use transport::StreamTransport;
