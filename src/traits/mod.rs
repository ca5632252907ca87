//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - streaming POST used by the transport
//! - [`StreamHandler`] - callbacks fired while a turn's stream is processed

pub mod handler;
pub mod http;

pub use handler::StreamHandler;
pub use http::{BodyStream, Headers, HttpClient, HttpError};
