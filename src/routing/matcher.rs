//! Route matching logic.
//!
//! # Responsibilities
//! - Match a request path against a route prefix
//! - Strip the matched prefix before forwarding
//!
//! # Design Decisions
//! - Comparison runs on the decoded path: percent escapes are decoded
//!   byte by byte, except `%2F`, which stays literal so an encoded slash
//!   never acts as a segment separator
//! - Comparison is ASCII case-insensitive; other bytes must be equal
//! - The path used for forwarding is never normalized or decoded; the
//!   prefix is cut from the raw path at the raw length it matched
//! - Empty prefix matches every path
//! - No regex to guarantee O(n) matching

use percent_encoding::percent_decode;

/// Length of the head of the raw `path` that matches `prefix`, if any.
pub fn matched_len(path: &str, prefix: &str) -> Option<usize> {
    let raw = path.as_bytes();
    let mut pos = 0;
    for &want in prefix.as_bytes() {
        let (got, width) = decoded_byte_at(raw, pos)?;
        if !got.eq_ignore_ascii_case(&want) {
            return None;
        }
        pos += width;
    }
    Some(pos)
}

/// Returns true if `prefix` is a case-insensitive prefix of the decoded `path`.
pub fn prefix_matches(path: &str, prefix: &str) -> bool {
    matched_len(path, prefix).is_some()
}

/// Remove a single leading occurrence of `prefix` from the raw `path`.
///
/// Returns `path` unchanged when the prefix does not match.
pub fn strip_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    matched_len(path, prefix)
        .and_then(|len| path.get(len..))
        .unwrap_or(path)
}

/// Decoded byte at `pos` and the number of raw bytes it spans.
fn decoded_byte_at(raw: &[u8], pos: usize) -> Option<(u8, usize)> {
    let byte = *raw.get(pos)?;
    if byte == b'%' {
        if let Some(escape) = raw.get(pos..pos + 3) {
            let mut decoded = percent_decode(escape);
            // A valid escape decodes to exactly one byte.
            if let (Some(value), None) = (decoded.next(), decoded.next()) {
                if value != b'/' {
                    return Some((value, 3));
                }
            }
        }
    }
    Some((byte, 1))
}
