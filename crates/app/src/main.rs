//! relayd - multiplexing relay daemon for the particle simulation

use std::path::PathBuf;
use std::process;

use clap::Parser;
use pewter_core::ServerConfig;
use pewter_net::RelayServer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod observer;

/// Relay server for the collaborative particle simulation
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind host (overrides the config file)
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Bind port (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match ServerConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to load config: {}", e);
                process::exit(1);
            }
        },
        None => ServerConfig::default(),
    };
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let server = match RelayServer::listen(config, observer::EventLog).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            process::exit(1);
        }
    };
    tracing::info!(addr = %server.addr(), "relayd listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to wait for shutdown signal: {}", e);
    }
    server.shutdown().await;
}
