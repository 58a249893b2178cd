//! Dispatch Gateway (v1)
//!
//! A region dispatch gateway built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────────┐
//!                          │                DISPATCH GATEWAY                   │
//!                          │                                                   │
//!     Client Request       │  ┌─────────┐    ┌──────────┐    ┌─────────────┐  │
//!     ─────────────────────┼─▶│  http   │───▶│ handlers │───▶│  registry   │  │
//!                          │  │ server  │    └────┬─────┘    │ region list │  │
//!                          │  └─────────┘         │          └─────────────┘  │
//!                          │                      │                            │
//!                          │                      ▼                            │
//!                          │  ┌──────────────┐  ┌─────────────┐               │
//!     Client Response      │  │   account    │  │  security   │               │
//!     ◀────────────────────┼──│    store     │  │ hash/token  │               │
//!                          │  └──────────────┘  └─────────────┘               │
//!                          │                      │                            │
//!                          │                      ▼                            │
//!                          │                  ┌─────────────┐                  │
//!                          │                  │   forward   │◀─────────────────┼──── Upstream
//!                          │                  │   client    │                  │     Region Server
//!                          │                  └─────────────┘                  │
//!                          │                                                   │
//!                          │  ┌─────────────────────────────────────────────┐ │
//!                          │  │            Cross-Cutting Concerns            │ │
//!                          │  │  ┌─────────┐ ┌─────────┐ ┌───────────────┐  │ │
//!                          │  │  │ config  │ │ net/tls │ │ observability │  │ │
//!                          │  │  └─────────┘ └─────────┘ └───────────────┘  │ │
//!                          │  │  ┌─────────────────────────────────────┐    │ │
//!                          │  │  │       lifecycle (shutdown)          │    │ │
//!                          │  │  └─────────────────────────────────────┘    │ │
//!                          │  └─────────────────────────────────────────────┘ │
//!                          └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use dispatch_gateway::account::MemoryAccountStore;
use dispatch_gateway::config;
use dispatch_gateway::observability::{init_logging, init_metrics};
use dispatch_gateway::{GatewayServer, Shutdown};

#[derive(Parser)]
#[command(name = "dispatch-gateway")]
#[command(about = "Region dispatch gateway for game clients", long_about = None)]
struct Args {
    /// Path to the gateway configuration file.
    #[arg(short, long, default_value = "dispatch.json")]
    config: PathBuf,

    /// Validate the configuration and exit without serving.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logging level lives in the config file, so the file is read first and
    // load failures go to stderr directly.
    let loaded = match config::load_or_create(&args.config) {
        Ok(loaded) => loaded,
        Err(error) => {
            eprintln!("configuration error: {error}");
            std::process::exit(1);
        }
    };

    init_logging(&loaded.config.observability.log_level);

    tracing::info!(
        path = %args.config.display(),
        created = loaded.created,
        migrated = loaded.migrated,
        "Configuration loaded"
    );

    let config = loaded.config;

    tracing::info!(
        host = %config.host,
        port = config.port,
        use_ssl = config.use_ssl,
        servers = config.servers.len(),
        "Dispatch gateway starting"
    );

    if args.check {
        tracing::info!("Configuration valid");
        return Ok(());
    }

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let accounts = Arc::new(MemoryAccountStore::new());
    let server = GatewayServer::new(config, accounts)?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    server.run(shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
