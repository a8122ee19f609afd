//! OCPP 2.0.1 central system binary
//!
//! Reads configuration from a TOML file (`--config` flag or `OCPP_CONFIG`
//! env var) and serves stations until Ctrl-C.

use clap::Parser;
use tracing::{error, info, warn};

use csms_core::{AppConfig, OcppServer, ShutdownSignal};

#[derive(Parser, Debug)]
#[command(name = "central-server", about = "OCPP 2.0.1 central system")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, env = "OCPP_CONFIG", default_value = "config.toml")]
    config: std::path::PathBuf,

    /// Override the configured listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the configured listen port
    #[arg(long)]
    port: Option<u16>,
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match AppConfig::load(&args.config) {
        Ok(cfg) => {
            init_tracing(&cfg.logging.level);
            info!("Configuration loaded from {}", args.config.display());
            cfg
        }
        Err(e) => {
            let cfg = AppConfig::default();
            init_tracing(&cfg.logging.level);
            warn!("Failed to load config: {}. Using defaults.", e);
            cfg
        }
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    info!("Starting OCPP 2.0.1 central system...");

    let shutdown = ShutdownSignal::new();
    let server = OcppServer::new(config, shutdown.clone());

    let ctrl_c_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
            ctrl_c_shutdown.trigger();
        }
    });

    if let Err(e) = server.run().await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Central system stopped");
    Ok(())
}
