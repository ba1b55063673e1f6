//! Startup orchestration.
//!
//! # Responsibilities
//! - Open (and seed) the store
//! - Build the HTTP server over it
//! - Serve until shutdown, then persist the snapshot
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently

use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::http::HttpServer;
use crate::routing::RouteError;
use crate::store::{Store, StoreError};

use super::Shutdown;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("route table error: {0}")]
    Routes(#[from] RouteError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Open the store, serve on `listener` until `shutdown` fires, then save.
pub async fn serve(
    config: AppConfig,
    listener: TcpListener,
    shutdown: &Shutdown,
) -> Result<(), StartupError> {
    let store = Store::open(&config.store).await?;
    tracing::info!(
        snapshot = config.store.snapshot_path.as_deref().unwrap_or("<memory>"),
        "Store ready"
    );

    let server = HttpServer::new(config, store.clone())?;
    server.run(listener, shutdown.subscribe()).await?;

    store.save().await?;
    Ok(())
}
