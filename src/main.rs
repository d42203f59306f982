use std::sync::Arc;

use docbase_api::app::{app, AppState};
use docbase_api::config;
use docbase_api::database::{ConnectionRegistry, MemoryConnector, PgConnector, SchemeConnector};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URI_*, DBNAME_ADMIN, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config();
    tracing::info!("Starting Docbase API in {:?} mode", config.environment);

    let connector = SchemeConnector::new(MemoryConnector::new(), PgConnector::from_config(&config.database));
    let registry = Arc::new(ConnectionRegistry::new(config.database.clone(), Arc::new(connector)));
    let state = AppState::new(registry.clone());
    state.bootstrap().await;

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("Docbase API listening on http://{}", bind_addr);

    axum::serve(listener, app(state, config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    registry.close_all().await;
    tracing::info!("Closed all database connections");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
