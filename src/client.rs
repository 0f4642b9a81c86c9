//! The conversion client: validate → sign → POST → stream the response.
//!
//! [`Client::convert`] is the primary entry point. The file and blocking
//! helpers are thin wrappers over it.

use crate::config::ClientConfig;
use crate::error::{ConvertError, TransportError};
use crate::output::ConversionStats;
use crate::pipeline::sign;
use crate::pipeline::validate::{self, XmlCheck};
use crate::transport::{ByteStream, ReqwestTransport, Transport, OCTET_STREAM};
use bytes::Bytes;
use futures::StreamExt;
use reqwest::Url;
use std::fmt;
use std::io::{Cursor, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Client for a remote XML conversion endpoint.
///
/// Holds only immutable configuration and a shared transport, so one
/// instance (or its clones) can serve concurrent calls as long as each call
/// brings its own input and output.
///
/// # Example
/// ```rust,no_run
/// use xmlconvert_client::{Client, ClientConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::builder("https://convert.example.com/api/Fop")
///     .secret("s3cr3t")
///     .build()?;
/// let client = Client::new(config)?;
///
/// let mut input = tokio::fs::File::open("invoice.fo").await?;
/// let mut output = tokio::fs::File::create("invoice.pdf").await?;
/// let stats = client.convert(&mut input, &mut output).await?;
/// eprintln!("{} bytes written", stats.bytes_written);
/// client.close();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    endpoint: Url,
    secret: Option<String>,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint.as_str())
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("transport", &"<dyn Transport>")
            .finish()
    }
}

impl Client {
    /// Build a client, creating the default reqwest transport unless one was
    /// injected through the config.
    pub fn new(config: ClientConfig) -> Result<Self, ConvertError> {
        let transport: Arc<dyn Transport> = match config.transport {
            Some(t) => t,
            None => Arc::new(ReqwestTransport::new(
                config.request_timeout_secs.map(Duration::from_secs),
            )?),
        };

        debug!("Client ready for {}", config.endpoint_url);
        Ok(Self {
            endpoint: config.endpoint_url,
            secret: config.secret,
            transport,
        })
    }

    /// Shorthand for an endpoint and secret with the default transport.
    pub fn from_endpoint(
        endpoint_url: impl Into<String>,
        secret: Option<&str>,
    ) -> Result<Self, ConvertError> {
        let config = ClientConfig::builder(endpoint_url)
            .maybe_secret(secret.map(str::to_string))
            .build()?;
        Self::new(config)
    }

    /// The configured endpoint, without a signature.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Signature this client would send for `body`.
    pub fn sign(&self, body: &[u8]) -> String {
        sign::sign_bytes(self.secret.as_deref(), body)
    }

    /// Full request URL for a given signature.
    pub fn request_url(&self, signature: &str) -> Url {
        sign::signed_url(&self.endpoint, signature)
    }

    /// Release the transport. Dropping the client has the same effect.
    pub fn close(self) {
        debug!("Closing client for {}", self.endpoint);
    }

    /// Convert `input` and stream the result into `output`.
    ///
    /// `input` is read from the start regardless of its current position.
    /// Neither stream is closed.
    ///
    /// # Errors
    /// - [`ConvertError::InvalidInput`] — not well-formed XML; no request sent
    /// - [`ConvertError::RemoteRejection`] — non-2xx; `output` untouched
    /// - [`ConvertError::Transport`] — no response, or the body broke off
    ///   (in which case `output` may hold a flushed prefix)
    /// - [`ConvertError::Io`] — reading `input` or writing `output` failed
    pub async fn convert<R, W>(
        &self,
        input: &mut R,
        output: &mut W,
    ) -> Result<ConversionStats, ConvertError>
    where
        R: AsyncRead + AsyncSeek + Unpin + Send + ?Sized,
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        let start = Instant::now();
        info!("Starting conversion via {}", self.endpoint);

        // ── Step 1: Rewind ───────────────────────────────────────────────────
        input.seek(SeekFrom::Start(0)).await?;

        // ── Step 2: Validate ─────────────────────────────────────────────────
        ensure_well_formed(input).await?;

        // ── Step 3: Sign ─────────────────────────────────────────────────────
        let signature = sign::sign_stream(self.secret.as_deref(), input).await?;

        // ── Step 4: Build URL ────────────────────────────────────────────────
        let url = sign::signed_url(&self.endpoint, &signature);
        debug!("Request URL: {}", url);

        // ── Step 5: POST ─────────────────────────────────────────────────────
        let mut body = Vec::new();
        input.read_to_end(&mut body).await?;
        let bytes_sent = body.len() as u64;

        let response = self
            .transport
            .post(&url, OCTET_STREAM, Bytes::from(body))
            .await?;

        // ── Step 6: Reject non-2xx ───────────────────────────────────────────
        if !response.is_success() {
            let status = response.status;
            let body = response.text().await?;
            warn!("Conversion service returned HTTP {}", status);
            return Err(ConvertError::RemoteRejection { status, body });
        }

        // ── Step 7: Stream response to output ────────────────────────────────
        let status = response.status;
        let bytes_written = copy_body(response.body, output).await?;

        let stats = ConversionStats {
            bytes_sent,
            bytes_written,
            status,
            signature,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            "Conversion complete: {} bytes in, {} bytes out, {}ms",
            stats.bytes_sent, stats.bytes_written, stats.duration_ms
        );
        Ok(stats)
    }

    /// Convert an in-memory document.
    pub async fn convert_bytes<W>(
        &self,
        input: &[u8],
        output: &mut W,
    ) -> Result<ConversionStats, ConvertError>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        let mut cursor = Cursor::new(input);
        self.convert(&mut cursor, output).await
    }

    /// Convert a file and write the result to `output_path`.
    ///
    /// The response is streamed into a temp file beside the destination and
    /// renamed into place only on success, so a failed call never leaves a
    /// partial or empty output file behind. Missing parent directories are
    /// created only once the input has validated, and are kept if the remote
    /// call then fails.
    pub async fn convert_file(
        &self,
        input_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
    ) -> Result<ConversionStats, ConvertError> {
        let path = output_path.as_ref();
        let write_failed = |source: std::io::Error| ConvertError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        let mut input = tokio::fs::File::open(input_path.as_ref()).await?;
        ensure_well_formed(&mut input).await?;

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        tokio::fs::create_dir_all(dir).await.map_err(write_failed)?;

        let tmp = tempfile::Builder::new()
            .prefix(".xmlconvert-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(write_failed)?;
        // `tmp_path` deletes the temp file on drop, i.e. on every error return.
        let (file, tmp_path) = tmp.into_parts();
        let mut out = tokio::fs::File::from_std(file);

        let stats = self.convert(&mut input, &mut out).await?;
        out.sync_all().await.map_err(write_failed)?;
        drop(out);

        tmp_path
            .persist(path)
            .map_err(|e| write_failed(e.error))?;
        debug!("Wrote {}", path.display());
        Ok(stats)
    }

    /// Synchronous wrapper around [`Client::convert_file`].
    ///
    /// Creates a temporary tokio runtime internally; do not call from inside
    /// an async context.
    pub fn convert_file_sync(
        &self,
        input_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
    ) -> Result<ConversionStats, ConvertError> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?
            .block_on(self.convert_file(input_path, output_path))
    }
}

/// Validate `input` from the start, leaving it rewound.
async fn ensure_well_formed<R>(input: &mut R) -> Result<(), ConvertError>
where
    R: AsyncRead + AsyncSeek + Unpin + Send + ?Sized,
{
    match validate::validate_stream(input).await? {
        XmlCheck::WellFormed { root } => {
            debug!("Input is well-formed (root <{}>)", root);
            Ok(())
        }
        XmlCheck::Malformed(reason) => {
            warn!("Rejecting input before sending: {}", reason);
            Err(ConvertError::InvalidInput { reason })
        }
    }
}

/// Copy every body chunk into `output`, flushing on the way out.
///
/// A transport error mid-body still flushes what was written so far.
async fn copy_body<W>(mut body: ByteStream, output: &mut W) -> Result<u64, ConvertError>
where
    W: AsyncWrite + Unpin + Send + ?Sized,
{
    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk: Bytes = match chunk {
            Ok(c) => c,
            Err(e) => {
                if let Err(flush_err) = output.flush().await {
                    warn!("Flushing partial output failed: {}", flush_err);
                }
                return Err(body_error(e, written));
            }
        };
        output.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    output.flush().await?;
    Ok(written)
}

fn body_error(e: TransportError, written: u64) -> ConvertError {
    warn!("Response body failed after {} bytes: {}", written, e);
    ConvertError::Transport(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportResponse;
    use async_trait::async_trait;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    struct Fixed(u16, &'static [u8]);

    #[async_trait]
    impl Transport for Fixed {
        async fn post(
            &self,
            _url: &Url,
            _content_type: &str,
            _body: Bytes,
        ) -> Result<TransportResponse, TransportError> {
            Ok(TransportResponse::from_bytes(self.0, self.1))
        }
    }

    /// Sends a few bytes of body, then drops the connection.
    struct BrokenBody;

    #[async_trait]
    impl Transport for BrokenBody {
        async fn post(
            &self,
            _url: &Url,
            _content_type: &str,
            _body: Bytes,
        ) -> Result<TransportResponse, TransportError> {
            Ok(TransportResponse::from_chunks(
                200,
                vec![
                    Ok(Bytes::from_static(b"%PDF-")),
                    Err(TransportError::Other("reset by peer".into())),
                ],
            ))
        }
    }

    /// Accepts writes but refuses to flush.
    #[derive(Default)]
    struct FlushRefused(Vec<u8>);

    impl AsyncWrite for FlushRefused {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            self.get_mut().0.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "flush refused")))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn client(transport: impl Transport + 'static) -> Client {
        let config = ClientConfig::builder("https://test.com/api/Fop")
            .secret("s3cr3t")
            .transport(Arc::new(transport))
            .build()
            .unwrap();
        Client::new(config).unwrap()
    }

    #[test]
    fn request_url_matches_signature() {
        let c = client(Fixed(200, b""));
        let sig = c.sign(b"<a/>");
        assert_eq!(sig, "12565097690f7d9a56daa9df3feb7c6d123a8872");
        assert_eq!(
            c.request_url(&sig).as_str(),
            "https://test.com/api/Fop?sig=12565097690f7d9a56daa9df3feb7c6d123a8872"
        );
    }

    #[test]
    fn debug_redacts_secret() {
        let dbg = format!("{:?}", client(Fixed(200, b"")));
        assert!(!dbg.contains("s3cr3t"), "got: {dbg}");
    }

    #[tokio::test]
    async fn copies_body_and_reports_stats() {
        let c = client(Fixed(200, b"%PDF-1.4 fake"));
        let mut out = Vec::new();
        let stats = c.convert_bytes(b"<a/>", &mut out).await.unwrap();
        assert_eq!(out, b"%PDF-1.4 fake");
        assert_eq!(stats.bytes_sent, 4);
        assert_eq!(stats.bytes_written, 13);
        assert_eq!(stats.status, 200);
        assert_eq!(stats.signature, c.sign(b"<a/>"));
    }

    #[tokio::test]
    async fn rejection_keeps_output_empty() {
        let c = client(Fixed(403, b"signatures do not match"));
        let mut out = Vec::new();
        let err = c.convert_bytes(b"<a/>", &mut out).await.unwrap_err();
        match err {
            ConvertError::RemoteRejection { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "signatures do not match");
            }
            other => panic!("expected RemoteRejection, got {other:?}"),
        }
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn write_failure_is_io_error() {
        let c = client(Fixed(200, b"converted"));
        let mut out = tokio_test::io::Builder::new()
            .write_error(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
            .build();
        let err = c.convert_bytes(b"<a/>", &mut out).await.unwrap_err();
        assert!(matches!(err, ConvertError::Io(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn broken_body_reported_even_when_flush_fails() {
        let c = client(BrokenBody);
        let mut out = FlushRefused::default();
        let err = c.convert_bytes(b"<a/>", &mut out).await.unwrap_err();
        assert!(
            matches!(err, ConvertError::Transport(TransportError::Other(ref m)) if m == "reset by peer"),
            "got {err:?}"
        );
        assert_eq!(out.0, b"%PDF-");
    }
}
