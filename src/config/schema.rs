//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.
//! The route table itself is not part of this file; it is loaded from the
//! separate JSON source named by `routes_path`.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Path of the route table source (JSON).
    pub routes_path: String,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Inbound request deadline.
    pub timeouts: TimeoutConfig,

    /// Outbound client and forwarding behavior.
    pub upstream: UpstreamConfig,

    /// Token validation settings.
    pub auth: AuthConfig,

    /// Remote log collector settings.
    pub remote_log: RemoteLogConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            routes_path: "routes.json".to_string(),
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            upstream: UpstreamConfig::default(),
            auth: AuthConfig::default(),
            remote_log: RemoteLogConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Inbound timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed from request arrival to response headers, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 120 }
    }
}

/// Outbound client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Skip certificate validation on the internal hop.
    pub accept_invalid_certs: bool,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Total time for one downstream exchange in seconds.
    pub request_timeout_secs: u64,

    /// How long idle pooled connections are kept, in seconds.
    pub pool_idle_timeout_secs: u64,

    /// Maximum idle pooled connections per downstream host.
    pub pool_max_idle_per_host: usize,

    /// Largest inbound body the gateway will buffer, in bytes.
    pub max_body_bytes: usize,

    /// Copy downstream response headers back to the client.
    pub relay_response_headers: bool,

    /// Follow downstream redirects instead of relaying them.
    pub follow_redirects: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            accept_invalid_certs: true,
            connect_timeout_secs: 10,
            request_timeout_secs: 100,
            pool_idle_timeout_secs: 90,
            pool_max_idle_per_host: 32,
            max_body_bytes: 30 * 1024 * 1024,
            relay_response_headers: true,
            follow_redirects: false,
        }
    }
}

/// Token validation configuration.
///
/// The key material has no defaults. Supply it here or through the
/// `GATEWAY_TOKEN_*` environment variables.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Require `Authorization` and `lp-auth-token` on every request.
    pub enabled: bool,

    /// Key-derivation passphrase.
    pub passphrase: String,

    /// Key-derivation salt.
    pub salt: String,

    /// PBKDF2 iteration count.
    pub iterations: u32,

    /// CBC initialization vector (16 ASCII bytes).
    pub init_vector: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            passphrase: String::new(),
            salt: String::new(),
            iterations: 2,
            init_vector: String::new(),
        }
    }
}

/// Remote log collector configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteLogConfig {
    /// Deployment environment name. `local` (any case) disables delivery.
    pub environment: String,

    /// Project name stamped on every record.
    pub project: String,

    /// Application name stamped on every record.
    pub app_name: String,

    /// Collector base URL; records are posted to `{api_base_url}/add-log`.
    pub api_base_url: String,

    /// Capacity of the in-process record queue.
    pub queue_capacity: usize,

    /// Timeout for a single delivery attempt, in seconds.
    pub delivery_timeout_secs: u64,
}

impl Default for RemoteLogConfig {
    fn default() -> Self {
        Self {
            environment: LOCAL_ENVIRONMENT.to_string(),
            project: String::new(),
            app_name: "lp-gateway".to_string(),
            api_base_url: String::new(),
            queue_capacity: 1024,
            delivery_timeout_secs: 10,
        }
    }
}

/// Environment name in which remote delivery is disabled.
pub const LOCAL_ENVIRONMENT: &str = "local";

impl RemoteLogConfig {
    /// Remote delivery is on unless the environment is unset or local.
    pub fn is_enabled(&self) -> bool {
        let env = self.environment.trim();
        !env.is_empty() && !env.eq_ignore_ascii_case(LOCAL_ENVIRONMENT)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
