//! Stream transport: opens the POST request that carries one turn's reply.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use tokio_util::sync::CancellationToken;

use crate::error::{ChatResult, NetworkError};
use crate::traits::{BodyStream, Headers, HttpClient, HttpError};

/// Opens cancellable streaming requests against the chat endpoint.
#[derive(Clone)]
pub struct StreamTransport {
    client: Arc<dyn HttpClient>,
    auth_token: Option<String>,
}

impl std::fmt::Debug for StreamTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamTransport")
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl StreamTransport {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self {
            client,
            auth_token: None,
        }
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token;
        self
    }

    fn headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert("Accept".to_string(), "text/event-stream".to_string());
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        if let Some(token) = &self.auth_token {
            headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        }
        headers
    }

    /// POST `payload` to `endpoint` and return the response body.
    ///
    /// Fails with [`NetworkError::HttpStatus`] on a non-2xx status,
    /// [`NetworkError::EmptyBody`] when there is no body, and
    /// [`NetworkError::Cancelled`] if `cancel` fires before the response
    /// headers arrive.
    pub async fn open_stream(
        &self,
        endpoint: &str,
        payload: &serde_json::Value,
        cancel: &CancellationToken,
    ) -> ChatResult<ByteStream> {
        if cancel.is_cancelled() {
            return Err(NetworkError::Cancelled.into());
        }

        let body = serde_json::to_string(payload)?;
        let headers = self.headers();
        tracing::debug!(endpoint, bytes = body.len(), "Opening chat stream");

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::info!(endpoint, "Stream request cancelled before response");
                return Err(NetworkError::Cancelled.into());
            }
            result = self.client.post_stream(endpoint, &body, &headers) => result,
        };

        let body = response.map_err(|e| {
            tracing::error!(endpoint, error = %e, "Failed to open chat stream");
            NetworkError::from_http(e, endpoint)
        })?;

        Ok(ByteStream::new(body, endpoint))
    }
}

/// Response body of an open stream.
///
/// Owns the underlying reader; dropping it releases the connection, which
/// happens on every exit path of the consumer.
pub struct ByteStream {
    inner: BodyStream,
    endpoint: String,
    bytes_read: u64,
    chunks_read: u64,
    on_release: Option<Box<dyn FnOnce() + Send>>,
}

impl ByteStream {
    pub fn new(inner: BodyStream, endpoint: &str) -> Self {
        Self {
            inner,
            endpoint: endpoint.to_string(),
            bytes_read: 0,
            chunks_read: 0,
            on_release: None,
        }
    }

    /// Wrap an in-memory stream, mostly for tests.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, HttpError>> + Send + 'static,
    {
        Self::new(Box::pin(stream), "memory")
    }

    /// Run `hook` once the reader is released.
    pub fn on_release(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_release = Some(Box::new(hook));
        self
    }
}

impl std::fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteStream")
            .field("endpoint", &self.endpoint)
            .field("bytes_read", &self.bytes_read)
            .field("chunks_read", &self.chunks_read)
            .finish_non_exhaustive()
    }
}

impl Stream for ByteStream {
    type Item = Result<Bytes, HttpError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let polled = this.inner.as_mut().poll_next(cx);
        if let Poll::Ready(Some(Ok(chunk))) = &polled {
            this.bytes_read += chunk.len() as u64;
            this.chunks_read += 1;
        }
        polled
    }
}

impl Drop for ByteStream {
    fn drop(&mut self) {
        tracing::debug!(
            endpoint = %self.endpoint,
            bytes = self.bytes_read,
            chunks = self.chunks_read,
            "Stream reader released"
        );
        if let Some(hook) = self.on_release.take() {
            hook();
        }
    }
}
