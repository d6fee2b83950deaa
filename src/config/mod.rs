//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! gateway.toml
//!     → loader.rs (parse & deserialize, env overrides for secrets)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!
//! routes.json
//!     → loader.rs (missing or malformed ⇒ empty table)
//!     → RouteTable (immutable, shared via Arc)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Token key material is never defaulted

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_route_table, ConfigError};
pub use schema::{
    AuthConfig, GatewayConfig, ListenerConfig, ObservabilityConfig, RemoteLogConfig,
    TimeoutConfig, UpstreamConfig,
};
