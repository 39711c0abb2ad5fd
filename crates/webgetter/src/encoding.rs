//! Character encoding detection and per-value recoding.
//!
//! Bodies are decoded once, with the encoding the response announces. A
//! trigger may name another encoding; values extracted from the document
//! are then moved from the announced encoding to the configured one (see
//! [`recode`]).

use std::borrow::Cow;
use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use regex::bytes::Regex as BytesRegex;
use regex::Regex;
use tracing::warn;

use crate::error::ExtractionEncodingError;

/// Bytes scanned for a `<meta>` charset declaration.
const META_SCAN_LIMIT: usize = 1024;

/// A decoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// The text.
    pub text: String,
    /// Encoding actually used (a BOM wins over the requested one).
    pub encoding: &'static Encoding,
    /// Whether malformed sequences were replaced.
    pub had_errors: bool,
}

/// Detect the encoding of a body: BOM, else the `charset` parameter of
/// `content_type`, else a `<meta>` declaration near the top, else UTF-8.
#[must_use]
pub fn detect(body: &[u8], content_type: Option<&str>) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(body) {
        return encoding;
    }
    if let Some(encoding) = content_type.and_then(header_charset) {
        return encoding;
    }
    meta_charset(body).unwrap_or(UTF_8)
}

/// The encoding named by the `charset` parameter of a `Content-Type` value.
#[must_use]
pub fn header_charset(content_type: &str) -> Option<&'static Encoding> {
    static CHARSET: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?i)charset\s*=\s*["']?([^"';\s]+)"#).expect("invalid regex")
    });

    let caps = CHARSET.captures(content_type)?;
    Encoding::for_label(caps[1].as_bytes())
}

/// The encoding declared by a `<meta charset>` or `<meta http-equiv>` tag in
/// the first kilobyte. A declared UTF-16 means UTF-8: an ASCII-compatible
/// declaration cannot describe a UTF-16 document.
#[must_use]
pub fn meta_charset(body: &[u8]) -> Option<&'static Encoding> {
    static META: LazyLock<BytesRegex> = LazyLock::new(|| {
        BytesRegex::new(r#"(?i-u)<meta[^>]+charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#)
            .expect("invalid regex")
    });

    let head = body.get(..META_SCAN_LIMIT).unwrap_or(body);
    let caps = META.captures(head)?;
    let encoding = Encoding::for_label(&caps[1])?;
    if encoding == UTF_16LE || encoding == UTF_16BE {
        Some(UTF_8)
    } else {
        Some(encoding)
    }
}

/// Decode `body` with `encoding`, replacing malformed sequences.
#[must_use]
pub fn decode(body: &[u8], encoding: &'static Encoding) -> Decoded {
    let (text, used, had_errors) = encoding.decode(body);
    Decoded {
        text: text.into_owned(),
        encoding: used,
        had_errors,
    }
}

/// Resolve a configured encoding label. Unknown labels are logged and
/// ignored.
#[must_use]
pub fn resolve_override(label: &str) -> Option<&'static Encoding> {
    let resolved = Encoding::for_label(label.trim().as_bytes());
    if resolved.is_none() {
        warn!(label, "ignoring unknown encoding");
    }
    resolved
}

/// Move a value decoded with `source` to `target`: the bytes `source` would
/// produce for it are decoded again with `target`.
///
/// # Errors
///
/// [`ExtractionEncodingError::Unencodable`] if `source` cannot represent
/// the value, [`ExtractionEncodingError::Undecodable`] if the bytes are not
/// valid in `target`.
pub fn recode(
    value: &str,
    source: &'static Encoding,
    target: &'static Encoding,
) -> Result<String, ExtractionEncodingError> {
    if source == target {
        return Ok(value.to_owned());
    }

    let (bytes, written, had_errors) = source.encode(value);
    if had_errors || written != source {
        return Err(ExtractionEncodingError::Unencodable {
            encoding: source.name(),
        });
    }

    target
        .decode_without_bom_handling_and_without_replacement(&bytes)
        .map(Cow::into_owned)
        .ok_or(ExtractionEncodingError::Undecodable {
            encoding: target.name(),
        })
}

#[cfg(test)]
mod tests {
    use encoding_rs::{ISO_8859_2, WINDOWS_1252};

    use super::*;

    #[test]
    fn test_bom_wins() {
        let body = b"\xEF\xBB\xBF<meta charset=latin1>";
        assert_eq!(detect(body, Some("text/html; charset=iso-8859-2")), UTF_8);
        assert_eq!(detect(b"\xFF\xFEa\0", None), UTF_16LE);
    }

    #[test]
    fn test_header_before_meta() {
        let body = b"<meta charset=\"iso-8859-2\">";
        assert_eq!(detect(body, Some("text/html; charset=\"latin1\"")), WINDOWS_1252);
        assert_eq!(detect(body, Some("text/html")), ISO_8859_2);
    }

    #[test]
    fn test_meta_http_equiv() {
        let body =
            b"<html><head><META HTTP-EQUIV=\"Content-Type\" CONTENT=\"text/html; charset=ISO-8859-2\">";
        assert_eq!(meta_charset(body), Some(ISO_8859_2));
    }

    #[test]
    fn test_meta_outside_scan_window_is_ignored() {
        let mut body = vec![b' '; META_SCAN_LIMIT];
        body.extend_from_slice(b"<meta charset=latin1>");
        assert_eq!(detect(&body, None), UTF_8);
    }

    #[test]
    fn test_meta_utf16_means_utf8() {
        assert_eq!(meta_charset(b"<meta charset=utf-16>"), Some(UTF_8));
    }

    #[test]
    fn test_unknown_labels() {
        assert_eq!(header_charset("text/html; charset=klingon"), None);
        assert_eq!(resolve_override("klingon"), None);
        assert_eq!(resolve_override(" UTF-8 "), Some(UTF_8));
    }

    #[test]
    fn test_decode_reports_errors() {
        let decoded = decode(b"caf\xE9", UTF_8);
        assert!(decoded.had_errors);
        assert_eq!(decoded.text, "caf\u{FFFD}");

        let decoded = decode(b"caf\xE9", WINDOWS_1252);
        assert!(!decoded.had_errors);
        assert_eq!(decoded.text, "café");
    }

    #[test]
    fn test_recode_repairs_mislabelled_utf8() {
        // UTF-8 bytes read as windows-1252
        let (mojibake, _, _) = WINDOWS_1252.decode("café".as_bytes());
        assert_eq!(mojibake, "cafÃ©");
        assert_eq!(recode(&mojibake, WINDOWS_1252, UTF_8).unwrap(), "café");
    }

    #[test]
    fn test_recode_failures() {
        assert_eq!(
            recode("日本", WINDOWS_1252, UTF_8),
            Err(ExtractionEncodingError::Unencodable {
                encoding: "windows-1252"
            })
        );
        assert_eq!(
            recode("é", WINDOWS_1252, UTF_8),
            Err(ExtractionEncodingError::Undecodable { encoding: "UTF-8" })
        );
    }

    #[test]
    fn test_recode_same_encoding_is_identity() {
        assert_eq!(recode("日本", UTF_8, UTF_8).unwrap(), "日本");
    }
}
