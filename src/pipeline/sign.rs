//! Request signing: HMAC-SHA1 over the raw body, rendered as lowercase hex.
//!
//! The service recomputes the same digest with its own copy of the secret and
//! compares strings, so the rendering is part of the wire contract: 40
//! lowercase hex characters, byte order, no separators. An absent secret
//! signs with the empty key.

use hmac::{Hmac, Mac};
use reqwest::Url;
use sha1::Sha1;
use std::io::{self, SeekFrom};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};
use tracing::debug;

type HmacSha1 = Hmac<Sha1>;

/// Length of a rendered signature: 20 digest bytes × 2 hex chars.
pub const SIGNATURE_HEX_LEN: usize = 40;

/// Query parameter carrying the signature.
pub const SIGNATURE_PARAM: &str = "sig";

const READ_CHUNK: usize = 8 * 1024;

fn keyed(secret: Option<&str>) -> HmacSha1 {
    match HmacSha1::new_from_slice(secret.unwrap_or("").as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts keys of any length"),
    }
}

/// Sign an in-memory body.
pub fn sign_bytes(secret: Option<&str>, body: &[u8]) -> String {
    let mut mac = keyed(secret);
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Sign `input` from position 0 to EOF, then rewind it to position 0.
pub async fn sign_stream<R>(secret: Option<&str>, input: &mut R) -> io::Result<String>
where
    R: AsyncRead + AsyncSeek + Unpin + ?Sized,
{
    input.seek(SeekFrom::Start(0)).await?;

    let mut mac = keyed(secret);
    let mut buf = vec![0u8; READ_CHUNK];
    let mut total = 0usize;
    loop {
        let n = input.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        mac.update(&buf[..n]);
        total += n;
    }

    input.seek(SeekFrom::Start(0)).await?;

    let signature = hex::encode(mac.finalize().into_bytes());
    debug!("Signed {} bytes", total);
    Ok(signature)
}

/// Append `sig=<signature>` to the endpoint, keeping any existing query.
pub fn signed_url(endpoint: &Url, signature: &str) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut().append_pair(SIGNATURE_PARAM, signature);
    url
}

/// Check a received signature the way the service does.
///
/// Only the canonical lowercase rendering is accepted. The digest
/// comparison is constant-time.
pub fn verify(secret: Option<&str>, body: &[u8], signature: &str) -> bool {
    if signature.len() != SIGNATURE_HEX_LEN
        || signature.bytes().any(|b| b.is_ascii_uppercase())
    {
        return false;
    }
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };

    let mut mac = keyed(secret);
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}
