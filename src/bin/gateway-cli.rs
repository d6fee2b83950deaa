use std::path::PathBuf;

use clap::{Parser, Subcommand};

use lp_gateway::auth::{TokenCipher, TokenSecrets};
use lp_gateway::config::{self, loader::apply_env_overrides, GatewayConfig};
use lp_gateway::error::ROUTE_NOT_FOUND_BODY;
use lp_gateway::http::request::target_uri;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator CLI for the LP API gateway", long_about = None)]
struct Cli {
    /// Gateway TOML configuration (token key material, routes path).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a plain-text payload into an lp-auth-token
    Encrypt { plaintext: String },
    /// Decrypt an lp-auth-token and print its payload
    Decrypt { token: String },
    /// Show where the gateway would forward a request
    Resolve {
        /// Request path and optional query, e.g. /users/5?x=1
        path: String,
        /// Value of the `version` request header
        #[arg(short, long)]
        version: Option<String>,
        /// Route table source; defaults to the configured routes_path
        #[arg(short, long)]
        routes: Option<PathBuf>,
    },
}

fn load(path: Option<&PathBuf>) -> Result<GatewayConfig, Box<dyn std::error::Error>> {
    // Only the pieces each command needs are checked, so skip full validation.
    let mut config: GatewayConfig = match path {
        Some(path) => toml::from_str(&std::fs::read_to_string(path)?)?,
        None => GatewayConfig::default(),
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

fn cipher(config: &GatewayConfig) -> Result<TokenCipher, Box<dyn std::error::Error>> {
    Ok(TokenCipher::new(&TokenSecrets::from(&config.auth))?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load(cli.config.as_ref())?;

    match cli.command {
        Commands::Encrypt { plaintext } => {
            println!("{}", cipher(&config)?.encrypt(&plaintext));
        }
        Commands::Decrypt { token } => {
            println!("{}", cipher(&config)?.decrypt(&token)?);
        }
        Commands::Resolve { path, version, routes } => {
            let routes_path = routes.unwrap_or_else(|| PathBuf::from(&config.routes_path));
            let table = config::load_route_table(&routes_path);
            let request = axum::http::Request::builder().uri(path.as_str()).body(())?;
            match table.resolve(request.uri().path(), version.as_deref()) {
                Some(route) => println!(
                    "{} -> {}",
                    route.path_prefix(),
                    target_uri(route, &request)
                ),
                None => {
                    eprintln!("{}", ROUTE_NOT_FOUND_BODY);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
