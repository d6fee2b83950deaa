//! Response relay.
//!
//! # Responsibilities
//! - Copy the downstream status code verbatim
//! - Copy downstream headers (minus connection-scoped ones) when enabled
//! - Stream the downstream body back without buffering it
//!
//! # Design Decisions
//! - The gateway never rewrites a downstream response, 5xx included
//! - Streaming responses avoid buffering entire body

use axum::{body::Body, response::Response};

use crate::http::headers::is_response_excluded;

/// Turn a downstream response into the client response.
pub fn relay(downstream: reqwest::Response, copy_headers: bool) -> Response {
    let status = downstream.status();
    let headers = copy_headers.then(|| downstream.headers().clone());

    let mut response = Response::new(Body::from_stream(downstream.bytes_stream()));
    *response.status_mut() = status;

    if let Some(headers) = headers {
        let out = response.headers_mut();
        for (name, value) in &headers {
            if !is_response_excluded(name) {
                out.append(name.clone(), value.clone());
            }
        }
    }

    response
}
