use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::app::app;
use crate::config::AppConfig;
use crate::state::AppState;

/// `RUST_LOG` wins; otherwise info for the service and HTTP spans
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info,sqlx=warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub async fn handle(port: Option<u16>) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env();
    if let Some(port) = port {
        config.server.port = port;
    }
    serve(config).await
}

pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    anyhow::ensure!(!config.security.jwt_secret.is_empty(), "JWT_SECRET must be set");
    tracing::info!("Starting association API in {:?} mode", config.environment);

    let port = config.server.port;
    let state = AppState::from_config(config).await.context("failed to initialise application state")?;
    let effects = state.effects.clone();

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app(state).into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Pending audit entries and notifications are written before exit
    effects.flush().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
