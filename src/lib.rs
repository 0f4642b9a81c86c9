//! # xmlconvert-client
//!
//! Submit XML documents to a remote conversion service (for example an
//! XSL-FO → PDF renderer) and stream the converted bytes back.
//!
//! The service authenticates each payload by recomputing an HMAC-SHA1 of the
//! request body with a shared secret and comparing it to the `sig` query
//! parameter. This crate produces that signature, refuses to send anything
//! that is not well-formed XML, and maps every failure onto one of three
//! error kinds: bad input, remote rejection, or transport failure.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input (AsyncRead + AsyncSeek)
//!  │
//!  ├─ 1. Rewind    seek to 0
//!  ├─ 2. Validate  well-formed XML? (no schema) ── no ──▶ InvalidInput
//!  ├─ 3. Sign      HMAC-SHA1(secret, body) → 40 hex chars, rewind
//!  ├─ 4. URL       {endpoint}?sig={hex}
//!  ├─ 5. POST      body as application/octet-stream via dyn Transport
//!  ├─ 6. Status    non-2xx ──▶ RemoteRejection(body text)
//!  └─ 7. Output    stream 2xx body into AsyncWrite
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xmlconvert_client::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::from_endpoint(
//!         "https://convert.example.com/api/Fop",
//!         Some("s3cr3t"),
//!     )?;
//!     let stats = client.convert_file("report.fo", "report.pdf").await?;
//!     eprintln!("{} bytes written", stats.bytes_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `xmlconvert` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! xmlconvert-client = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod transport;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::Client;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{ConvertError, TransportError};
pub use output::ConversionStats;
pub use pipeline::sign::{sign_bytes, verify, SIGNATURE_HEX_LEN};
pub use pipeline::validate::{check_well_formed, XmlCheck};
pub use transport::{ByteStream, ReqwestTransport, Transport, TransportResponse};
