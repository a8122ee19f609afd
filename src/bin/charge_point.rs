//! Simulated charge point binary
//!
//! Connects to a central system, boots, heartbeats, and answers remote
//! commands until Ctrl-C. Reconnects forever with a fixed delay.

use std::time::Duration;

use clap::Parser;
use tracing::info;

use csms_core::client::{ChargePoint, ChargePointConfig};
use csms_core::ShutdownSignal;

#[derive(Parser, Debug)]
#[command(name = "charge-point", about = "Simulated OCPP 2.0.1 charging station")]
struct Args {
    /// Central system base URL
    #[arg(long, env = "OCPP_SERVER_URL", default_value = "ws://127.0.0.1:9000")]
    server_url: String,

    /// Station identity
    #[arg(long, env = "CHARGE_POINT_ID", default_value = "CP_1")]
    station_id: String,

    /// Reported station model
    #[arg(long, default_value = "RZG2L")]
    model: String,

    /// Reported station vendor
    #[arg(long, default_value = "Renesas Electronics")]
    vendor: String,

    /// Seconds between reconnect attempts
    #[arg(long, default_value_t = 5)]
    reconnect_delay_secs: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ChargePointConfig {
        server_url: args.server_url,
        station_id: args.station_id,
        model: args.model,
        vendor: args.vendor,
        reconnect_delay: Duration::from_secs(args.reconnect_delay_secs),
        ..ChargePointConfig::default()
    };

    info!(
        station_id = config.station_id.as_str(),
        server_url = config.server_url.as_str(),
        "Starting charge point"
    );

    let shutdown = ShutdownSignal::new();
    let ctrl_c_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
            ctrl_c_shutdown.trigger();
        }
    });

    let charge_point = ChargePoint::new(config, shutdown);
    charge_point.run().await;
    info!("Charge point stopped");
}
