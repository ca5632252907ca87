//! Mock HTTP client for testing.
//!
//! Provides a configurable mock HTTP client that returns scripted byte
//! streams or errors, so the store and processor can be exercised without
//! network access.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::traits::{BodyStream, Headers, HttpClient, HttpError};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body
    pub body: String,
}

impl RecordedRequest {
    /// Parse the recorded body as JSON.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Stream the chunks, then end the body.
    Stream(Vec<Bytes>),
    /// Stream the chunks, then fail the read.
    StreamThenError(Vec<Bytes>, HttpError),
    /// Stream the chunks, then never yield again.
    StreamThenHang(Vec<Bytes>),
    /// Fail the request itself.
    Error(HttpError),
    /// Never resolve the request.
    Hang,
}

impl MockResponse {
    /// Stream built from string chunks.
    pub fn sse<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MockResponse::Stream(
            chunks
                .into_iter()
                .map(|c| Bytes::from(c.into()))
                .collect(),
        )
    }
}

/// Mock HTTP client for testing.
///
/// Responses are looked up in this order: the FIFO queue filled by
/// [`MockHttpClient::push_response`], an exact URL match, a URL prefix
/// match, and finally the default response.
///
/// # Example
///
/// ```ignore
/// use donkin::adapters::mock::{MockHttpClient, MockResponse};
///
/// let client = MockHttpClient::new();
/// client.set_default_response(MockResponse::sse([
///     "event: message\ndata: {\"content\":\"hi\",\"sequence\":1}\n\n",
/// ]));
///
/// let body = client.post_stream("http://test/chat", "{}", &Headers::new()).await?;
/// assert_eq!(client.get_requests().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    /// Configured responses by URL pattern
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// One-shot responses consumed in order
    queued: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Default response when no specific match
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a response for a URL (exact or prefix match).
    pub fn set_response(&self, url: &str, response: MockResponse) {
        lock(&self.responses).insert(url.to_string(), response);
    }

    /// Queue a response for the next request, regardless of URL.
    pub fn push_response(&self, response: MockResponse) {
        lock(&self.queued).push_back(response);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        *lock(&self.default_response) = Some(response);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Number of requests made so far.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        lock(&self.requests).clear();
    }

    fn record_request(&self, url: &str, headers: &Headers, body: &str) {
        lock(&self.requests).push(RecordedRequest {
            url: url.to_string(),
            headers: headers.clone(),
            body: body.to_string(),
        });
    }

    fn get_response(&self, url: &str) -> Option<MockResponse> {
        if let Some(response) = lock(&self.queued).pop_front() {
            return Some(response);
        }

        let responses = lock(&self.responses);
        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }
        for (pattern, response) in responses.iter() {
            if url.starts_with(pattern) {
                return Some(response.clone());
            }
        }
        drop(responses);

        lock(&self.default_response).clone()
    }
}

fn chunk_stream(chunks: Vec<Bytes>) -> impl futures::Stream<Item = Result<Bytes, HttpError>> {
    futures::stream::iter(chunks.into_iter().map(Ok))
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<BodyStream, HttpError> {
        self.record_request(url, headers, body);

        match self.get_response(url) {
            Some(MockResponse::Stream(chunks)) => Ok(Box::pin(chunk_stream(chunks))),
            Some(MockResponse::StreamThenError(chunks, err)) => Ok(Box::pin(
                chunk_stream(chunks).chain(futures::stream::once(async move { Err(err) })),
            )),
            Some(MockResponse::StreamThenHang(chunks)) => {
                Ok(Box::pin(chunk_stream(chunks).chain(futures::stream::pending())))
            }
            Some(MockResponse::Error(err)) => Err(err),
            Some(MockResponse::Hang) => futures::future::pending().await,
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(stream: BodyStream) -> Vec<Result<Bytes, HttpError>> {
        stream.collect().await
    }

    #[tokio::test]
    async fn test_stream_response_and_recording() {
        let client = MockHttpClient::new();
        client.set_response(
            "http://test/chat",
            MockResponse::sse(["event: heartbeat\ndata: {}\n\n"]),
        );

        let mut headers = Headers::new();
        headers.insert("Accept".to_string(), "text/event-stream".to_string());
        let body = client
            .post_stream("http://test/chat", r#"{"id":"t"}"#, &headers)
            .await
            .unwrap();
        let chunks = collect(body).await;
        assert_eq!(chunks.len(), 1);

        let requests = client.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].json().unwrap()["id"], "t");
        assert_eq!(
            requests[0].headers.get("Accept").map(String::as_str),
            Some("text/event-stream")
        );
    }

    #[tokio::test]
    async fn test_queue_takes_priority() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::sse(["data"]));
        client.push_response(MockResponse::Error(HttpError::EmptyBody));

        let first = client.post_stream("http://x", "", &Headers::new()).await;
        assert!(matches!(first, Err(HttpError::EmptyBody)));

        let second = client.post_stream("http://x", "", &Headers::new()).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_prefix_match() {
        let client = MockHttpClient::new();
        client.set_response("http://api", MockResponse::sse(["a", "b"]));
        let body = client
            .post_stream("http://api/v1/chat", "", &Headers::new())
            .await
            .unwrap();
        assert_eq!(collect(body).await.len(), 2);
    }

    #[tokio::test]
    async fn test_stream_then_error() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::StreamThenError(
            vec![Bytes::from("x")],
            HttpError::Io("reset".to_string()),
        ));
        let body = client.post_stream("http://x", "", &Headers::new()).await.unwrap();
        let chunks = collect(body).await;
        assert!(chunks[0].is_ok());
        assert_eq!(chunks[1], Err(HttpError::Io("reset".to_string())));
    }

    #[tokio::test]
    async fn test_no_response_configured() {
        let client = MockHttpClient::new();
        let result = client.post_stream("http://nowhere", "", &Headers::new()).await;
        assert!(matches!(result, Err(HttpError::Other(_))));
    }
}
