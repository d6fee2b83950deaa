//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and formats (addresses, URLs, key material)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::auth::crypto::IV_LEN;
use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

impl std::error::Error for ValidationError {}

/// Check a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.upstream.max_body_bytes == 0 {
        errors.push(ValidationError::new("upstream.max_body_bytes", "must be greater than 0"));
    }

    let auth = &config.auth;
    if auth.enabled {
        if auth.passphrase.is_empty() {
            errors.push(ValidationError::new("auth.passphrase", "must not be empty"));
        }
        if auth.salt.is_empty() {
            errors.push(ValidationError::new("auth.salt", "must not be empty"));
        }
        if auth.init_vector.len() != IV_LEN {
            errors.push(ValidationError::new(
                "auth.init_vector",
                format!("must be exactly {} bytes, got {}", IV_LEN, auth.init_vector.len()),
            ));
        }
        if auth.iterations == 0 {
            errors.push(ValidationError::new("auth.iterations", "must be at least 1"));
        }
    }

    let remote = &config.remote_log;
    if remote.is_enabled() {
        if url::Url::parse(&remote.api_base_url).is_err() {
            errors.push(ValidationError::new(
                "remote_log.api_base_url",
                format!("'{}' is not an absolute URL", remote.api_base_url),
            ));
        }
        if remote.queue_capacity == 0 {
            errors.push(ValidationError::new("remote_log.queue_capacity", "must be greater than 0"));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
