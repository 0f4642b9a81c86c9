//! Well-formedness check for the input document.
//!
//! Only syntax is checked: balanced tags, valid encoding, exactly one root
//! element. Any root name and any namespace are accepted and no schema is
//! consulted. A parse failure is an outcome ([`XmlCheck::Malformed`]), never
//! an error; only I/O on the caller's stream can fail.
//!
//! The encoding is taken from the byte-order mark, then from the
//! `encoding="…"` pseudo-attribute of the XML declaration, and defaults to
//! UTF-8. The document is transcoded to UTF-8 for parsing only; the bytes
//! that get signed and sent are never altered.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use std::borrow::Cow;
use std::io::{self, SeekFrom};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};
use tracing::debug;

/// Result of a well-formedness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlCheck {
    /// The document parsed; `root` is the local name of its root element.
    WellFormed { root: String },
    /// The document did not parse. Holds the parser's reason.
    Malformed(String),
}

impl XmlCheck {
    pub fn is_well_formed(&self) -> bool {
        matches!(self, XmlCheck::WellFormed { .. })
    }
}

/// Check an in-memory document.
pub fn check_well_formed(bytes: &[u8]) -> XmlCheck {
    if bytes.is_empty() {
        return XmlCheck::Malformed("document is empty".into());
    }

    let (encoding, skip) = match detect_encoding(bytes) {
        Ok(found) => found,
        Err(reason) => return XmlCheck::Malformed(reason),
    };
    let text = match decode(encoding, &bytes[skip..]) {
        Ok(text) => text,
        Err(reason) => return XmlCheck::Malformed(reason),
    };
    if encoding != UTF_8 {
        debug!("Decoded {} bytes as {}", bytes.len(), encoding.name());
    }

    // DTDs are skipped over, not rejected.
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };

    match roxmltree::Document::parse_with_options(&text, options) {
        Ok(doc) => XmlCheck::WellFormed {
            root: doc.root_element().tag_name().name().to_string(),
        },
        Err(e) => XmlCheck::Malformed(e.to_string()),
    }
}

/// Encoding of `bytes` and the length of any byte-order mark to skip.
fn detect_encoding(bytes: &[u8]) -> Result<(&'static Encoding, usize), String> {
    if let Some(found) = Encoding::for_bom(bytes) {
        return Ok(found);
    }
    // Without a BOM, UTF-16 still opens with `<?` as two 16-bit units.
    if bytes.starts_with(b"<\0?\0") {
        return Ok((UTF_16LE, 0));
    }
    if bytes.starts_with(b"\0<\0?") {
        return Ok((UTF_16BE, 0));
    }

    let Some(label) = declared_encoding(bytes) else {
        return Ok((UTF_8, 0));
    };
    match Encoding::for_label(label) {
        Some(enc) if enc == UTF_16LE || enc == UTF_16BE => Err(format!(
            "document declares {} but is not encoded as UTF-16",
            String::from_utf8_lossy(label)
        )),
        Some(enc) => Ok((enc, 0)),
        None => Err(format!(
            "unsupported encoding \"{}\"",
            String::from_utf8_lossy(label)
        )),
    }
}

/// The `encoding` value of a leading `<?xml …?>` declaration, if any.
fn declared_encoding(bytes: &[u8]) -> Option<&[u8]> {
    let head = bytes.strip_prefix(b"<?xml")?;
    if !head.first()?.is_ascii_whitespace() {
        return None;
    }
    let end = head.windows(2).position(|w| w == b"?>")?;
    let decl = &head[..end];

    let at = decl.windows(8).position(|w| w == b"encoding")?;
    let rest = skip_space(&decl[at + 8..]);
    let rest = skip_space(rest.strip_prefix(b"=")?);
    let (&quote, rest) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let len = rest.iter().position(|&b| b == quote)?;
    Some(&rest[..len])
}

fn skip_space(bytes: &[u8]) -> &[u8] {
    let n = bytes.iter().take_while(|b| b.is_ascii_whitespace()).count();
    &bytes[n..]
}

/// Strict decode: bytes invalid in `encoding` are rejected, never replaced.
fn decode<'a>(encoding: &'static Encoding, bytes: &'a [u8]) -> Result<Cow<'a, str>, String> {
    if encoding == UTF_8 {
        return std::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|e| format!("invalid UTF-8 at byte {}", e.valid_up_to()));
    }
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or_else(|| format!("input is not valid {}", encoding.name()))
}

/// Read `input` from the start and check it.
///
/// The stream is rewound to position 0 afterwards whether or not the
/// document is well-formed.
pub async fn validate_stream<R>(input: &mut R) -> io::Result<XmlCheck>
where
    R: AsyncRead + AsyncSeek + Unpin + ?Sized,
{
    input.seek(SeekFrom::Start(0)).await?;
    let mut buf = Vec::new();
    let read = input.read_to_end(&mut buf).await;
    input.seek(SeekFrom::Start(0)).await?;
    read?;

    let check = check_well_formed(&buf);
    debug!("Validated {} bytes: {:?}", buf.len(), check);
    Ok(check)
}
