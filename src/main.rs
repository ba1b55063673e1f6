//! Build manager API server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ cors ──▶ dispatch ──▶ route table
//!                                                              │
//!                                                              ▼
//!                                                          handlers
//!                                                    (auth, builds, characters,
//!                                                     favorites, system)
//!                                                              │
//!                                                              ▼
//!     Client Response                                   store (in-memory,
//!     ◀────────────── JSON envelope ◀──────────────────  JSON snapshot)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use build_manager::config::{load_config, schema::DEFAULT_SECRET};
use build_manager::lifecycle::{self, Shutdown};
use build_manager::observability;

#[derive(Parser)]
#[command(name = "build-manager")]
#[command(about = "Build manager JSON API", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Environment variables override it.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    observability::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "build-manager starting");

    if config.auth.secret == DEFAULT_SECRET {
        tracing::warn!("JWT_SECRET is not set, tokens are signed with the default secret");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        debug = config.debug,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::init_metrics(addr)?,
            Err(err) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %err,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    lifecycle::shutdown_on_signal(shutdown.clone());
    lifecycle::serve(config, listener, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
