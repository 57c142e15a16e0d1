//! Response body decoding.
//!
//! Order of precedence: byte order mark, then the XML declaration's
//! `encoding`, then the Content-Type `charset`, then UTF-8. Bodies that
//! do not decode cleanly are rejected rather than patched with U+FFFD.

use encoding_rs::{Encoding, UTF_8};
use thiserror::Error;

/// Only this many leading bytes are searched for an XML declaration.
const DECLARATION_SCAN_BYTES: usize = 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The XML declaration names an encoding we cannot decode.
    #[error("unsupported encoding '{0}' declared by the document")]
    UnknownEncoding(String),

    /// The body contains bytes that are invalid in its encoding.
    #[error("body is not valid {0}")]
    Malformed(String),
}

/// Decode a response body to a string.
///
/// # Examples
/// ```
/// use oai_harvester::decode::decode_body;
///
/// let body = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><title>Citt\xe0</title>";
/// let text = decode_body(body, None).unwrap();
/// assert!(text.ends_with("<title>Citt\u{e0}</title>"));
/// ```
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> Result<String, DecodeError> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return decode_with(&bytes[bom_len..], encoding);
    }

    if let Some(label) = declared_encoding(bytes) {
        let encoding = Encoding::for_label(label.as_bytes())
            .ok_or_else(|| DecodeError::UnknownEncoding(label.clone()))?;
        // A declaration readable as ASCII rules out UTF-16 without a BOM
        return decode_with(bytes, encoding.output_encoding());
    }

    if let Some(encoding) = content_type
        .and_then(extract_charset)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return decode_with(bytes, encoding.output_encoding());
    }

    decode_with(bytes, UTF_8)
}

/// The `encoding` pseudo-attribute of a leading `<?xml ...?>` declaration.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(DECLARATION_SCAN_BYTES)];
    if !head.starts_with(b"<?xml") {
        return None;
    }
    let end = head.windows(2).position(|w| w == b"?>")?;
    let declaration = std::str::from_utf8(&head[..end]).ok()?;

    let rest = &declaration[declaration.find("encoding")? + "encoding".len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &rest[1..];
    let close = value.find(quote)?;

    Some(value[..close].trim().to_string())
}

fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim().trim_matches(&['"', '\''][..]).to_string())
        })
        .next()
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> Result<String, DecodeError> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or_else(|| DecodeError::Malformed(encoding.name().to_string()))
}
