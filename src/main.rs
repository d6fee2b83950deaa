//! LP API Gateway
//!
//! Accepts inbound HTTP requests, validates the proprietary token pair,
//! resolves a downstream target from a version-aware route table, and
//! relays the downstream response.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                      GATEWAY                         │
//!                    │                                                      │
//!   Client Request   │  ┌──────────┐   ┌──────────┐   ┌──────────────┐      │
//!   ─────────────────┼─▶│  error   │──▶│   auth   │──▶│   routing    │      │
//!                    │  │ boundary │   │ validator│   │   resolver   │      │
//!                    │  └──────────┘   └──────────┘   └──────┬───────┘      │
//!                    │                                       │              │
//!                    │                                       ▼              │
//!   Client Response  │  ┌──────────┐                 ┌──────────────┐      │
//!   ◀────────────────┼──│ response │◀────────────────│  forwarder   │◀─────┼── Downstream
//!                    │  │  relay   │                 │ (pooled      │      │   Service
//!                    │  └──────────┘                 │  client)     │      │
//!                    │                               └──────────────┘      │
//!                    │  ┌────────────────────────────────────────────────┐ │
//!                    │  │ config │ observability (tracing, metrics,      │ │
//!                    │  │        │ remote log) │ lifecycle               │ │
//!                    │  └────────────────────────────────────────────────┘ │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use lp_gateway::config::{self, loader::apply_env_overrides, validation::validate_config, GatewayConfig};
use lp_gateway::http::GatewayServer;
use lp_gateway::lifecycle::{signals, Shutdown};
use lp_gateway::observability::{logging, metrics, remote};

/// Upper bound on flushing queued log records at shutdown.
const LOG_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "lp-gateway")]
#[command(about = "Version-aware API gateway", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the route table source path.
    #[arg(short, long)]
    routes: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => {
            let mut config = GatewayConfig::default();
            apply_env_overrides(&mut config, |name| std::env::var(name).ok());
            validate_config(&config).map_err(config::ConfigError::Validation)?;
            config
        }
    };
    if let Some(routes) = &args.routes {
        config.routes_path = routes.display().to_string();
    }

    logging::init_tracing(&config.observability.log_level);
    tracing::info!("lp-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes_path = %config.routes_path,
        request_timeout_secs = config.timeouts.request_secs,
        environment = %config.remote_log.environment,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let routes = config::load_route_table(PathBuf::from(&config.routes_path).as_path());

    let shutdown = Shutdown::new();
    signals::trigger_on_signal(shutdown.clone());

    let (sink, shipper) = remote::start(&config.remote_log, shutdown.subscribe())?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = GatewayServer::new(config, routes, sink)?;
    server.run(listener, shutdown.subscribe()).await?;

    // The server can also stop on its own (listener error); make sure the
    // shipper is told either way.
    shutdown.trigger();
    if let Some(handle) = shipper {
        if tokio::time::timeout(LOG_FLUSH_TIMEOUT, handle).await.is_err() {
            tracing::warn!("Timed out flushing remote log records");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
