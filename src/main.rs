//! Channel relay server.
//!
//! # Architecture Overview
//!
//! ```text
//!   operator / upstream caller
//!        │
//!        ▼
//!   ┌─────────┐   ┌──────────────┐   ┌──────────────────┐   ┌─────────────┐
//!   │  http   │──▶│    admin     │──▶│ health::         │──▶│  channel    │
//!   │ server  │   │  handlers    │   │ LifecycleCtrl    │   │  store      │
//!   └────┬────┘   └──────────────┘   │  + classifier    │   └─────────────┘
//!        │                           └────────┬─────────┘
//!        │                                    ▼
//!        │                              ┌──────────┐
//!        │                              │  notify  │ (log / webhook)
//!        ▼                              └──────────┘
//!   ┌───────────────┐
//!   │ payments      │ (gateway callbacks)
//!   └───────────────┘
//!
//!   config (file + watcher) ──▶ live ArcSwap<RelayConfig>
//!   lifecycle (signals) ──▶ graceful shutdown + snapshot save
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use channel_relay::config::{load_config, watcher::ConfigWatcher, RelayConfig};
use channel_relay::lifecycle::{wait_for_shutdown_signal, Shutdown};
use channel_relay::observability::{logging, metrics};
use channel_relay::HttpServer;

#[derive(Parser)]
#[command(name = "channel-relay")]
#[command(about = "Upstream channel health relay", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "channel-relay starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        channels = config.channels.len(),
        automatic_disable = config.channel_health.automatic_disable,
        automatic_enable = config.channel_health.automatic_enable,
        "Configuration loaded"
    );

    if config.admin.uses_placeholder_key() {
        tracing::warn!("admin.api_key is still the shipped placeholder; set a real key");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // The watcher handle must outlive the server.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            (Some(watcher.run()?), rx)
        }
        None => {
            let (_tx, rx) = mpsc::unbounded_channel();
            (None, rx)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, config_updates, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
