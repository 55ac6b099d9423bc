//! Character set detection and body decoding

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::sync::LazyLock;

/// How many leading bytes are scanned for a `<meta charset>` declaration
pub const META_SCAN_BYTES: usize = 1024;

static CONTENT_TYPE_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)charset=([^;]+)").expect("CONTENT_TYPE_CHARSET: hardcoded regex is valid")
});

static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset=["']?([^"'>\s]+)"#)
        .expect("META_CHARSET: hardcoded regex is valid")
});

/// Extracts the `charset` parameter from a Content-Type header value
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    CONTENT_TYPE_CHARSET
        .captures(content_type)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|label| !label.is_empty())
}

/// Looks for a `<meta ... charset=...>` declaration near the start of a body
pub fn charset_from_meta(body: &[u8]) -> Option<String> {
    let head = &body[..body.len().min(META_SCAN_BYTES)];
    let head = String::from_utf8_lossy(head);

    META_CHARSET
        .captures(&head)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Picks the charset label for a response
///
/// The Content-Type header wins over a meta declaration, which wins over
/// `default`.
pub fn resolve_charset(content_type: &str, body: &[u8], default: &str) -> String {
    charset_from_content_type(content_type)
        .or_else(|| charset_from_meta(body))
        .unwrap_or_else(|| default.to_string())
}

/// Decodes `bytes` using the encoding named by `label`
///
/// Returns the text and the canonical name of the encoding actually used.
/// Unknown labels fall back to lossy UTF-8, so decoding never fails.
pub fn decode_body(bytes: &[u8], label: &str) -> (String, String) {
    match Encoding::for_label(label.trim().as_bytes()) {
        Some(encoding) => {
            let (text, used, had_errors) = encoding.decode(bytes);
            if had_errors {
                tracing::debug!("Malformed {} sequences replaced while decoding", used.name());
            }
            (text.into_owned(), used.name().to_string())
        }
        None => {
            tracing::debug!("Unknown charset '{}', decoding as UTF-8", label);
            (
                String::from_utf8_lossy(bytes).into_owned(),
                UTF_8.name().to_string(),
            )
        }
    }
}
