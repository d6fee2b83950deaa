//! Request forwarding.
//!
//! Exactly one downstream attempt per request. Transport failures become
//! 502 and are reported to the remote log; downstream 5xx responses are
//! reported too but relayed unchanged.

use axum::{
    body::Body,
    http::Request,
    response::Response,
};

use crate::config::UpstreamConfig;
use crate::error::GatewayError;
use crate::http::request::{buffer_body, build_forward_request, carries_body};
use crate::http::response::relay;
use crate::observability::{metrics, RemoteLogSink};
use crate::routing::RouteEntry;

/// Sends resolved requests downstream over the shared client.
#[derive(Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    sink: RemoteLogSink,
    max_body_bytes: usize,
    relay_response_headers: bool,
}

impl Forwarder {
    pub fn new(client: reqwest::Client, sink: RemoteLogSink, config: &UpstreamConfig) -> Self {
        Self {
            client,
            sink,
            max_body_bytes: config.max_body_bytes,
            relay_response_headers: config.relay_response_headers,
        }
    }

    /// Forward `request` to `route` and relay the answer.
    ///
    /// For body-carrying methods the inbound body is buffered; `request`
    /// still holds a readable copy when this returns.
    pub async fn forward(
        &self,
        route: &RouteEntry,
        request: &mut Request<Body>,
    ) -> Result<Response, GatewayError> {
        let body = if carries_body(request.method()) {
            Some(buffer_body(request, self.max_body_bytes).await?)
        } else {
            None
        };

        let outbound = build_forward_request(route, &*request, body)?;
        let target = outbound.url.to_string();
        tracing::debug!(method = %outbound.method, target = %target, "Forwarding request");

        match outbound.into_reqwest(&self.client).send().await {
            Ok(downstream) => {
                let status = downstream.status();
                if status.is_server_error() {
                    metrics::record_downstream_error("5xx");
                    tracing::warn!(target = %target, status = %status, "Downstream service returned server error");
                    self.sink.warn(
                        Some(&format!("Downstream service error: {}", status.as_u16())),
                        "Downstream service returned 5xx error.",
                    );
                }
                Ok(relay(downstream, self.relay_response_headers))
            }
            Err(e) => {
                metrics::record_downstream_error("transport");
                tracing::error!(target = %target, error = %e, "Error forwarding request to downstream service");
                self.sink
                    .log(Some(&e.to_string()), "Error forwarding request to downstream service.");
                Err(GatewayError::DownstreamTransport(e))
            }
        }
    }
}
