use std::net::SocketAddr;

use engine_bridge::http::{router, AppState};
use engine_bridge::BridgeConfig;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Listen address override.
const ENV_BRIDGE_ADDR: &str = "ENGINE_BRIDGE_ADDR";
const DEFAULT_BRIDGE_ADDR: &str = "0.0.0.0:8000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let config = BridgeConfig::from_env()?;
    tracing::info!(
        engine = %config.engine_path().display(),
        protocol = %config.protocol(),
        "engine configured"
    );

    let addr: SocketAddr = std::env::var(ENV_BRIDGE_ADDR)
        .unwrap_or_else(|_| DEFAULT_BRIDGE_ADDR.to_string())
        .parse()?;

    let state = AppState::from_config(config);
    let sessions = state.sessions.clone();
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sessions.shutdown().await;
    tracing::info!("bridge stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {}", e);
    }
}
