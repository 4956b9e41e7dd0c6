//! party-router
//!
//! Serves a route table declared in a TOML manifest.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ http::server (request ID, timeout, trace)
//!                          │
//!                          ▼
//!                      routing::Router::resolve ◀── ArcSwap<RouteTable>
//!                          │                              ▲
//!                          ▼                              │
//!                      handler chain (http::context)   lifecycle::startup
//!                          │                              ▲
//!     Client Response      ▼                              │
//!     ◀─────────────── status + headers + body       config::watcher
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;
use clap::Parser;
use tokio::net::TcpListener;

use party_router::config::{load_config, watcher::ConfigWatcher, AppConfig};
use party_router::http::{HandlerRegistry, HttpServer};
use party_router::lifecycle::{build_table, reload, signals, Shutdown};
use party_router::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "party-router")]
#[command(about = "Dynamic HTTP request router", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not reload the route table when the configuration file changes.
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "party-router starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        request_timeout_secs = config.timeouts.request_secs,
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

    let handlers = HandlerRegistry::new();
    let table = Arc::new(ArcSwap::from_pointee(build_table(&config, &handlers)?));
    let shutdown = Arc::new(Shutdown::new());

    // Keep the watcher alive for the lifetime of the server.
    let _watcher = match (&cli.config, cli.no_watch) {
        (Some(path), false) => {
            let (watcher, mut updates) = ConfigWatcher::new(path);
            let handle = watcher.run()?;
            let table = table.clone();
            let bind_address = config.listener.bind_address.clone();
            let mut stop = shutdown.subscribe();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        Some(new_config) = updates.recv() => {
                            match reload(&table, &new_config, &handlers) {
                                Ok(_) if new_config.listener.bind_address != bind_address => {
                                    tracing::warn!(
                                        current = %bind_address,
                                        configured = %new_config.listener.bind_address,
                                        "Listener address changes require a restart"
                                    );
                                }
                                Ok(_) => {}
                                // Logged and counted by reload; the previous table stays live.
                                Err(_) => {}
                            }
                        }
                        _ = stop.recv() => break,
                        else => break,
                    }
                }
            });
            Some(handle)
        }
        _ => None,
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::trigger_on_ctrl_c(&signal_shutdown).await;
    });

    let server = HttpServer::new(&config, table);
    server.run(listener, shutdown.wait()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
