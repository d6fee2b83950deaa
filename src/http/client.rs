//! Shared outbound HTTP client.
//!
//! One pooled, keep-alive client is built at startup and cloned into every
//! handler; clones share the same connection pool.

use std::time::Duration;

use reqwest::redirect::Policy;

use crate::config::UpstreamConfig;

/// Build the client used for every downstream exchange.
///
/// System proxy settings are ignored: downstream targets are internal.
pub fn build_client(config: &UpstreamConfig) -> Result<reqwest::Client, reqwest::Error> {
    if config.accept_invalid_certs {
        tracing::warn!("Downstream TLS certificate validation is disabled");
    }

    let redirect = if config.follow_redirects {
        Policy::default()
    } else {
        Policy::none()
    };

    reqwest::Client::builder()
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        // Bounds each wait for downstream bytes, not the whole exchange, so
        // a long but steadily streaming body is relayed in full.
        .read_timeout(Duration::from_secs(config.request_timeout_secs))
        .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .redirect(redirect)
        .no_proxy()
        .build()
}
