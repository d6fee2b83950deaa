//! Request-path error kinds and their HTTP mapping.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;

pub const ROUTE_NOT_FOUND_BODY: &str = "Route not found.";
pub const FORWARDING_FAILED_BODY: &str = "Error forwarding request.";
pub const PAYLOAD_TOO_LARGE_BODY: &str = "Request body too large.";

/// Everything that can end a request before a downstream response exists.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No route in the selected or default group matched.
    #[error("No matching route found for {path} with version {}", .version.as_deref().unwrap_or(""))]
    RouteNotFound {
        path: String,
        version: Option<String>,
    },

    #[error(transparent)]
    Unauthorized(#[from] AuthError),

    /// Connect failure, DNS failure, timeout, or broken exchange.
    #[error("Downstream transport failure: {0}")]
    DownstreamTransport(#[source] reqwest::Error),

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Anything not anticipated by the components above.
    #[error("{0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GatewayError::DownstreamTransport(_) => StatusCode::BAD_GATEWAY,
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Marker left in response extensions so the error boundary can record
/// failures that were already turned into a response.
#[derive(Debug, Clone)]
pub struct UnhandledFailure {
    pub detail: String,
}

/// JSON body of every 500 response.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub status: u16,
    pub message: &'static str,
    pub detail: String,
}

impl ErrorEnvelope {
    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            message: "Internal Server Error",
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

fn plain(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            GatewayError::RouteNotFound { .. } => plain(status, ROUTE_NOT_FOUND_BODY.to_string()),
            GatewayError::Unauthorized(e) => plain(status, e.to_string()),
            GatewayError::DownstreamTransport(_) => plain(status, FORWARDING_FAILED_BODY.to_string()),
            GatewayError::PayloadTooLarge { .. } => plain(status, PAYLOAD_TOO_LARGE_BODY.to_string()),
            GatewayError::Internal(detail) => {
                let mut response = ErrorEnvelope::internal(detail.clone()).into_response();
                response.extensions_mut().insert(UnhandledFailure { detail });
                response
            }
        }
    }
}
