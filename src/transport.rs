//! Transport seam: "POST these bytes to this URL, give me status + body".
//!
//! The client never talks to reqwest directly. It holds an
//! `Arc<dyn Transport>`, so tests can inject a deterministic double and
//! embedders can route requests through their own HTTP stack. The default
//! implementation is [`ReqwestTransport`].
//!
//! Response bodies are a boxed [`ByteStream`] rather than a buffered `Vec`
//! so a large converted document can be copied to the output chunk by chunk.

use crate::error::TransportError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use std::fmt;
use std::pin::Pin;
use std::time::Duration;
use tokio_stream::Stream;
use tracing::debug;

/// Media type declared for every request body.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// A boxed stream of response body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Status and body returned by a [`Transport`].
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, not yet read.
    pub body: ByteStream,
}

impl TransportResponse {
    /// Wrap an already-open body stream.
    pub fn new(status: u16, body: ByteStream) -> Self {
        Self { status, body }
    }

    /// A response whose body is a single in-memory chunk.
    pub fn from_bytes(status: u16, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        let chunks = if body.is_empty() { vec![] } else { vec![Ok(body)] };
        Self::from_chunks(status, chunks)
    }

    /// A response that yields the given chunks (or errors) in order.
    pub fn from_chunks(status: u16, chunks: Vec<Result<Bytes, TransportError>>) -> Self {
        Self::new(status, Box::pin(stream::iter(chunks)))
    }

    /// Any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Drain the body and decode it as text. Invalid UTF-8 is replaced
    /// rather than rejected: the text is diagnostic only.
    pub async fn text(mut self) -> Result<String, TransportError> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("body", &"<stream>")
            .finish()
    }
}

/// Sends one HTTP POST and hands back the response.
///
/// Implementations must be safe to call concurrently; the client shares one
/// instance across every `convert` call.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` to `url` with the given `Content-Type`.
    ///
    /// A non-2xx status is **not** an error at this layer; only failures to
    /// obtain a response at all are.
    async fn post(
        &self,
        url: &Url,
        content_type: &str,
        body: Bytes,
    ) -> Result<TransportResponse, TransportError>;
}

/// Default transport backed by a pooled [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with an optional whole-request timeout.
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Reuse an existing reqwest client (and its connection pool).
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(
        &self,
        url: &Url,
        content_type: &str,
        body: Bytes,
    ) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        debug!("POST {} → HTTP {}", url.path(), status);

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(TransportError::from));
        Ok(TransportResponse::new(status, Box::pin(body)))
    }
}
