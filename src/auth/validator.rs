//! Token validation middleware.
//!
//! Every request must carry `Authorization: Bearer <token>` and an
//! encrypted `lp-auth-token`. The latter has to decrypt to well-formed
//! JSON; its fields are not inspected. On success the bearer token is
//! attached to the request as [`AuthContext`] and the still-encrypted
//! token is re-sent downstream in `api-auth-key`.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::crypto::{CryptoError, TokenCipher};
use crate::error::GatewayError;

/// Inbound header carrying the encrypted token.
pub const LP_AUTH_TOKEN: HeaderName = HeaderName::from_static("lp-auth-token");
/// Outbound header re-carrying the encrypted token.
pub const API_AUTH_KEY: HeaderName = HeaderName::from_static("api-auth-key");

const BEARER_PREFIX: &str = "Bearer ";

/// Why a request was rejected. The client only ever sees the fixed text.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid or missing Authorization token.")]
    MissingBearer,

    #[error("Missing lp-auth-token.")]
    MissingLpToken,

    #[error("Authentication failed.")]
    Decryption(#[source] CryptoError),

    #[error("Authentication failed.")]
    MalformedPayload(#[source] serde_json::Error),
}

/// Request-scoped result of a successful validation.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Authorization value without the `Bearer ` prefix.
    pub bearer_token: String,
    /// The `lp-auth-token` value exactly as received.
    pub encrypted_token: HeaderValue,
}

impl AuthContext {
    /// Replace any inbound `api-auth-key` with the encrypted token.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(API_AUTH_KEY, self.encrypted_token.clone());
    }
}

/// Validates the proprietary token pair.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    cipher: TokenCipher,
}

impl TokenValidator {
    pub fn new(cipher: TokenCipher) -> Self {
        Self { cipher }
    }

    pub fn validate(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .ok_or(AuthError::MissingBearer)?;

        let bearer_token = authorization
            .get(..BEARER_PREFIX.len())
            .filter(|p| p.eq_ignore_ascii_case(BEARER_PREFIX))
            .map(|_| authorization[BEARER_PREFIX.len()..].to_string())
            .ok_or(AuthError::MissingBearer)?;

        let encrypted_token = headers
            .get(LP_AUTH_TOKEN)
            .filter(|v| !v.as_bytes().trim_ascii().is_empty())
            .ok_or(AuthError::MissingLpToken)?;

        // Opaque bytes outside the base64 alphabet fail decoding below.
        let plain = self
            .cipher
            .decrypt(&String::from_utf8_lossy(encrypted_token.as_bytes()))
            .map_err(AuthError::Decryption)?;

        serde_json::from_str::<serde_json::Value>(&plain).map_err(AuthError::MalformedPayload)?;

        Ok(AuthContext {
            bearer_token,
            encrypted_token: encrypted_token.clone(),
        })
    }
}

/// Axum middleware enforcing [`TokenValidator`].
pub async fn auth_middleware(
    State(validator): State<Arc<TokenValidator>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match validator.validate(request.headers()) {
        Ok(ctx) => {
            ctx.apply(request.headers_mut());
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Err(e) => {
            match &e {
                AuthError::Decryption(cause) => {
                    tracing::warn!(error = %cause, path = %request.uri().path(), "Authentication failed");
                }
                AuthError::MalformedPayload(cause) => {
                    tracing::warn!(error = %cause, path = %request.uri().path(), "Authentication failed: token payload is not JSON");
                }
                _ => {
                    tracing::debug!(reason = %e, path = %request.uri().path(), "Rejected unauthenticated request");
                }
            }
            GatewayError::Unauthorized(e).into_response()
        }
    }
}
