//! Webhook relay (v1)
//!
//! Receives webhook deliveries on behalf of connections that cannot expose a
//! public endpoint themselves, and forwards each one to the callback URL the
//! connection registered.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────────┐
//!                        │                    WEBHOOK RELAY                     │
//!                        │                                                      │
//!  subscribe/unsubscribe │  ┌──────────┐    ┌──────────────┐                    │
//!  ──────────────────────┼─▶│ handlers │───▶│   registry   │                    │
//!                        │  └──────────┘    │ id ──▶ url   │                    │
//!                        │                  └──────┬───────┘                    │
//!  delivery /<id>        │  ┌──────────┐    ┌──────▼───────┐    ┌────────────┐  │
//!  ──────────────────────┼─▶│ routing  │───▶│  forwarding  │───▶│ destination│──┼──▶ Webhook
//!                        │  │correlator│    │ headers+POST │    │  response  │  │
//!  /proxy?webhook_url=   │  └──────────┘    └──────▲───────┘    └────────────┘  │
//!  ──────────────────────┼───────────────────────────┘                          │
//!                        │                                                      │
//!                        │  config (TOML, hot reload) · observability · lifecycle│
//!                        └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use webhook_relay::config::{load_config, ConfigWatcher, RelayConfig};
use webhook_relay::lifecycle::{wait_for_shutdown_signal, Shutdown};
use webhook_relay::observability::{logging, metrics};
use webhook_relay::RelayServer;

#[derive(Parser)]
#[command(name = "webhook-relay", version)]
#[command(about = "Relay webhook deliveries to registered callback URLs", long_about = None)]
struct Args {
    /// Path to a TOML configuration file (watched for changes).
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the port of the API listener.
    #[arg(short, long, env = "RELAY_LISTEN_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };
    if let Some(port) = args.port {
        let mut addr: SocketAddr = config.listener.bind_address.parse()?;
        addr.set_port(port);
        config.listener.bind_address = addr.to_string();
    }

    logging::init_tracing(&config.observability)?;

    tracing::info!("webhook-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        ingress_address = ?config.listener.ingress_address,
        connect_timeout_ms = config.forwarding.connect_timeout_ms,
        read_timeout_ms = config.forwarding.read_timeout_ms,
        "Configuration loaded"
    );

    // Keep the watcher alive for the lifetime of the server.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            match watcher.run() {
                Ok(watcher) => (Some(watcher), updates),
                Err(e) => {
                    tracing::warn!(error = %e, "Config hot reload unavailable");
                    (None, updates)
                }
            }
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        shutdown.trigger();
    });

    let server = RelayServer::new(config)?;
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
