//! CORS relay
//!
//! Forwards `GET|POST /?url=<target>` to the target and returns the upstream
//! body with `Access-Control-Allow-Origin: *`.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                  CORS RELAY                  │
//!     Browser             │  ┌──────┐   ┌────────────┐   ┌───────────┐   │
//!     ────────────────────┼─▶│ cors │──▶│ request id │──▶│   fault   │   │
//!     GET /?url=...       │  │layer │   │  + trace   │   │ boundary  │   │
//!                         │  └──────┘   └────────────┘   └─────┬─────┘   │
//!                         │                                    ▼         │
//!     ◀───────────────────┼── response.rs / error.rs ◀── forwarder ──────┼──▶ Target
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use cors_relay::config::{load_config, validate_config, ConfigError, RelayConfig};
use cors_relay::http::HttpServer;
use cors_relay::lifecycle::Shutdown;
use cors_relay::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "cors-relay")]
#[command(about = "HTTP relay that adds permissive CORS headers", long_about = None)]
struct Cli {
    /// Port to listen on (default 13222)
    #[arg(short, long)]
    port: Option<u16>,

    /// Interface to bind (default 0.0.0.0)
    #[arg(long)]
    host: Option<String>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };
    if let Some(port) = cli.port {
        config.listener.port = port;
    }
    if let Some(host) = cli.host {
        config.listener.host = host;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_tracing(&config.observability.log_level);
    logging::install_panic_hook();

    tracing::info!("cors-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        connect_timeout_secs = config.timeouts.connect_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Address already checked by validate_config
        let addr = config.observability.metrics_address.parse()?;
        if let Err(e) = metrics::init_metrics(addr) {
            tracing::error!(error = %e, "Failed to start metrics endpoint");
        }
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
