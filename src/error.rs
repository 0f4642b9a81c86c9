//! Error types for the xmlconvert-client library.
//!
//! Every `convert*` call ends in exactly one of these outcomes:
//!
//! * [`ConvertError::InvalidInput`] — the input is not well-formed XML.
//!   Raised before any network activity; the caller fixes the input.
//!
//! * [`ConvertError::RemoteRejection`] — the service answered with a
//!   non-2xx status. The response body is kept verbatim as diagnostic text
//!   and never reaches the output stream.
//!
//! * [`ConvertError::Transport`] — the request never produced a response, or
//!   the response body broke off mid-copy. Wraps a [`TransportError`].
//!
//! The client never retries and never swallows one of these; the caller
//! decides what is recoverable.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the xmlconvert-client library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input stream is not well-formed XML. No request was sent.
    #[error("Input is not well-formed XML: {reason}\nNo request was sent to the conversion service.")]
    InvalidInput { reason: String },

    /// Reading or rewinding the input, or writing the output, failed.
    #[error("Stream I/O failed: {0}")]
    Io(#[from] std::io::Error),

    // ── Remote errors ─────────────────────────────────────────────────────
    /// The conversion service returned a non-success status.
    #[error("Conversion service rejected the request with HTTP {status}: {body}")]
    RemoteRejection { status: u16, body: String },

    /// The request could not be delivered or the response broke off.
    #[error(transparent)]
    Transport(#[from] TransportError),

    // ── File errors ───────────────────────────────────────────────────────
    /// Could not create, write or rename the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ConvertError {
    /// `true` when the service itself answered, as opposed to the input or
    /// the network failing.
    pub fn is_remote_rejection(&self) -> bool {
        matches!(self, ConvertError::RemoteRejection { .. })
    }
}

/// Failure inside a [`crate::transport::Transport`].
///
/// Custom transports and test doubles use [`TransportError::Other`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The default reqwest transport failed (connect, DNS, TLS, timeout, body).
    #[error("HTTP transport error: {0}\nCheck the endpoint URL and your network connection.")]
    Http(#[from] reqwest::Error),

    /// Any other transport failure.
    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Whether the failure was a timeout imposed on the transport.
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Http(e) => e.is_timeout(),
            TransportError::Other(_) => false,
        }
    }
}
