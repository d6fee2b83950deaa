//! Configuration loading from disk.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::routing::{RouteTable, RouteTableSource};

/// Environment variable overriding `auth.passphrase`.
pub const PASSPHRASE_ENV_VAR: &str = "GATEWAY_TOKEN_PASSPHRASE";
/// Environment variable overriding `auth.salt`.
pub const SALT_ENV_VAR: &str = "GATEWAY_TOKEN_SALT";
/// Environment variable overriding `auth.init_vector`.
pub const INIT_VECTOR_ENV_VAR: &str = "GATEWAY_TOKEN_IV";
/// Environment variable overriding `remote_log.environment`.
pub const ENVIRONMENT_ENV_VAR: &str = "GATEWAY_ENVIRONMENT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, apply environment overrides to, and validate a TOML config file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: GatewayConfig = toml::from_str(&content)?;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay secrets and the deployment environment from the process
/// environment. `lookup` is injected so tests need not touch real env vars.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup(PASSPHRASE_ENV_VAR) {
        config.auth.passphrase = v;
    }
    if let Some(v) = lookup(SALT_ENV_VAR) {
        config.auth.salt = v;
    }
    if let Some(v) = lookup(INIT_VECTOR_ENV_VAR) {
        config.auth.init_vector = v;
    }
    if let Some(v) = lookup(ENVIRONMENT_ENV_VAR) {
        config.remote_log.environment = v;
    }
}

/// Load the route table source.
///
/// Never fails: a missing, unreadable, or malformed source yields an empty
/// table, which makes every request resolve to 404.
pub fn load_route_table(path: &Path) -> RouteTable {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(path = ?path, "Route table source not found, starting with no routes");
            return RouteTable::empty();
        }
        Err(e) => {
            tracing::error!(path = ?path, error = %e, "Failed to read route table source, starting with no routes");
            return RouteTable::empty();
        }
    };

    let table = parse_route_table(&content).unwrap_or_else(|e| {
        tracing::error!(path = ?path, error = %e, "Failed to parse route table source, starting with no routes");
        RouteTable::empty()
    });

    for entry in table.all_entries() {
        if url::Url::parse(entry.target_base_uri()).is_err() {
            tracing::warn!(
                path_prefix = %entry.path_prefix(),
                target = %entry.target_base_uri(),
                "Route target is not an absolute URL; requests to it will fail"
            );
        }
    }

    tracing::info!(
        path = ?path,
        default_routes = table.default_group().len(),
        versions = table.version_count(),
        "Route table loaded"
    );
    table
}

/// Parse a route table source document.
pub fn parse_route_table(content: &str) -> Result<RouteTable, serde_json::Error> {
    let source: RouteTableSource = serde_json::from_str(content)?;
    Ok(RouteTable::from(source))
}
