//! Header policy for both legs of a forwarded exchange.
//!
//! # Design Decisions
//! - Inbound copy drops only `Host`, `Content-Length`, `Transfer-Encoding`;
//!   everything else is carried as-is, including values that a stricter
//!   client would refuse to build
//! - Response relay drops connection-scoped headers and `Content-Length`,
//!   since the body is re-streamed

use axum::http::{header, HeaderName};

/// Inbound headers never copied onto the outbound request.
pub const REQUEST_EXCLUDED: [HeaderName; 3] = [
    header::HOST,
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
];

/// Downstream response headers never relayed to the client.
pub const RESPONSE_EXCLUDED: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::CONTENT_LENGTH,
];

pub fn is_request_excluded(name: &HeaderName) -> bool {
    REQUEST_EXCLUDED.contains(name)
}

pub fn is_response_excluded(name: &HeaderName) -> bool {
    RESPONSE_EXCLUDED.contains(name)
}
