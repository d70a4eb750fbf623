use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod domain;
mod id;
mod mappers;
mod pagination;
mod rest;

use config::Config;
use db::DbConnection;
use rest::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;
    info!("Loaded configuration: {:?}", config);

    info!("Setting up database");
    let db = DbConnection::new(&config.database_url, config.max_connections)
        .await
        .with_context(|| format!("Failed to open payment store at {}", config.database_url))?;

    let addr = config.listen_addr();
    let app = create_router(AppState::new(Arc::new(db), config));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
