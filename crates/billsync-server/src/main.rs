//! billsync Server: application entry point.

use std::net::SocketAddr;

use billsync_db::StoreClient;
use billsync_server::{AppBackend, AppState, ServerConfig, cors_layer, router};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("billsync=info")),
        )
        .json()
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "billsync server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    info!(
        port = config.port,
        debug = config.debug,
        webhook_auth = config.webhook_secret.is_some(),
        "Starting billsync server..."
    );

    let store = StoreClient::connect(&config.store)?;
    let backend = AppBackend::new(store, config.outbound_timeout)?;
    let state = AppState::new(backend, config.sync_config());
    let app = router(state).layer(cors_layer(&config.cors_allowed_origins));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("billsync server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
