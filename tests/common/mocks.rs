//! Mock implementations for test fixtures.
//!
//! Re-exports the mock HTTP client from `donkin::adapters::mock` and adds
//! stream shapes that several tests need.

pub use donkin::adapters::mock::{MockHttpClient, MockResponse, RecordedRequest};
pub use donkin::traits::{Headers, HttpClient, HttpError};

use bytes::Bytes;

/// Concatenate `frames` and cut the result into chunks of `size` bytes,
/// splitting frames (and possibly characters) at arbitrary points.
pub fn rechunk(frames: &[String], size: usize) -> Vec<Bytes> {
    let all = frames.concat().into_bytes();
    all.chunks(size.max(1))
        .map(|c| Bytes::copy_from_slice(c))
        .collect()
}

/// Response that streams `frames` in `size`-byte chunks.
pub fn chunked_response(frames: &[String], size: usize) -> MockResponse {
    MockResponse::Stream(rechunk(frames, size))
}

/// Response that streams `frames` and then drops the connection.
pub fn dropped_response(frames: &[String]) -> MockResponse {
    MockResponse::StreamThenError(
        frames.iter().map(|f| Bytes::from(f.clone())).collect(),
        HttpError::Io("connection reset by peer".to_string()),
    )
}

/// Response that streams `frames` and then stays open.
pub fn open_response(frames: &[String]) -> MockResponse {
    MockResponse::StreamThenHang(frames.iter().map(|f| Bytes::from(f.clone())).collect())
}
