//! Development reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                  DEV PROXY                   │
//!     Client Request    │  ┌─────────┐    ┌─────────┐    ┌──────────┐  │
//!     ──────────────────┼─▶│  http   │───▶│ routing │───▶│ forward  │──┼──▶ Backend
//!                       │  │ server  │    │  table  │    │ (hyper)  │  │
//!                       │  └─────────┘    └────┬────┘    └──────────┘  │
//!                       │                      │                       │
//!                       │              ┌───────┴───────┐               │
//!                       │              │   observers   │               │
//!                       │              │ (log/metrics) │               │
//!                       │              └───────────────┘               │
//!                       │  ┌────────────────────────────────────────┐  │
//!                       │  │ config + watcher │ lifecycle │ logging │  │
//!                       │  └────────────────────────────────────────┘  │
//!                       └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use dev_proxy::config::{load_or_default, watcher::ConfigWatcher};
use dev_proxy::lifecycle::{signals, Shutdown};
use dev_proxy::observability::{logging, metrics};
use dev_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "dev-proxy")]
#[command(about = "Development reverse proxy for API backends", long_about = None)]
struct Args {
    /// TOML config file. Built-in rules are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload proxy rules when the config file changes.
    #[arg(short, long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_or_default(args.config.as_deref())?;

    logging::init(&config.observability)?;

    tracing::info!("dev-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rules = config.rules.len(),
        fallback = ?config.fallback,
        config_file = ?args.config,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // The watcher handle must outlive the server.
    let (_watcher, config_updates) = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            (Some(watcher.run()?), rx)
        }
        _ => (None, mpsc::unbounded_channel().1),
    };

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
