//! control-gateway
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                 GATEWAY                      │
//!     Client              │  ┌──────────┐   upgrade    ┌──────────────┐  │
//!     ────────────────────┼─▶│  server  │─────────────▶│   upgrade    │──┼──▶ control channel
//!                         │  │ (axum)   │              │ auth + slot  │  │    (playback engine)
//!                         │  └────┬─────┘              └──────────────┘  │
//!                         │       │ request                              │
//!                         │       ▼                                      │
//!                         │  ┌──────────┐    ┌─────────────┐             │
//!                         │  │ dispatch │───▶│ route table │──▶ handler  │
//!                         │  │ + error  │    └─────────────┘             │
//!                         │  │ boundary │───▶ plugin chain ──▶ plugins   │
//!                         │  └──────────┘                                │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tokio::net::TcpListener;

use control_gateway::config::{load_config, GatewayConfig};
use control_gateway::error::GatewayError;
use control_gateway::http::{builtin, GatewayServer, UpgradeHandler, UpgradeSlot, WebSocketControl};
use control_gateway::lifecycle::{signals, startup, Shutdown};
use control_gateway::observability::{logging, metrics};
use control_gateway::routing::{PluginChain, RouteTable};

#[derive(Parser)]
#[command(name = "control-gateway")]
#[command(about = "Inbound connection gateway for an audio control node", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let started = Instant::now();
    let cli = Cli::parse();

    let (config, missing_config) = if cli.config.exists() {
        (load_config(&cli.config)?, false)
    } else {
        (GatewayConfig::default(), true)
    };

    logging::init(&config.observability);
    if missing_config {
        tracing::warn!(path = %cli.config.display(), "Config file not found, using defaults");
    }
    startup::log_startup_summary(&config);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Plugin discovery lives outside the gateway; none are bundled.
    let plugins = PluginChain::new();
    let mut routes = RouteTable::new();
    builtin::register(&mut routes, &plugins)?;

    let upgrade = UpgradeSlot::lazy(|| async {
        let (control, mut sessions) = WebSocketControl::new();
        tokio::spawn(async move {
            while let Some(session) = sessions.recv().await {
                tokio::spawn(session.run_until_closed());
            }
        });
        Ok::<_, GatewayError>(Arc::new(control) as Arc<dyn UpgradeHandler>)
    });

    let bind_address = config.server.bind_address();
    let listener = TcpListener::bind(&bind_address).await?;
    startup::log_started(&bind_address, started);

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    let server = GatewayServer::new(config, routes, plugins, upgrade);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
