// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use tracing_subscriber::EnvFilter;

use crate::application::session::IngestionSession;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::line_bridge::LineBridgeTransport;
use crate::presentation::app_state::AppState;
use crate::presentation::server::{router, run_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Create transport (infrastructure layer)
    let transport = LineBridgeTransport::new(
        config.bridge.address.clone(),
        Duration::from_millis(config.bridge.reconnect_min_ms),
        Duration::from_millis(config.bridge.reconnect_max_ms),
    );

    // Start ingestion (application layer)
    let session = IngestionSession::start(Box::new(transport), &config.ingest);

    let state = Arc::new(AppState {
        snapshots: session.subscribe(),
        recent_default: config.ingest.recent_default,
    });

    // Build router (presentation layer)
    let app = router(state);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!(%addr, bridge = %config.bridge.address, "starting race-telemetry service");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    run_server(listener, app, session, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;

    Ok(())
}
