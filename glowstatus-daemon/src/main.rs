mod dispatcher;
mod engine;
mod routes;
mod schedule;
mod singleton;
mod state;

use anyhow::Result;
use axum::Router;
use glowstatus_core::GlowConfig;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::engine::{Engine, EngineCommand};
use crate::state::AppState;

const DEFAULT_PORT: u16 = 4123;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Ensure only one instance is running
    let _lock = singleton::acquire_lock()?;

    let config = GlowConfig::load_or_default();

    let (tx, rx) = mpsc::channel::<EngineCommand>(32);
    let engine = Engine::new(config);
    let engine_handle = tokio::spawn(engine.run(rx));

    let state = AppState::new(tx.clone());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::status::router())
        .merge(routes::control::router())
        .with_state(state)
        .layer(cors);

    let addr = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT));
    info!("glowstatusd listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Lights off before exit, then wait for the engine to finish.
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
    if tx.send(EngineCommand::Shutdown { reply: reply_tx }).await.is_ok() {
        let _ = reply_rx.await;
    }
    let _ = engine_handle.await;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => {
            tracing::error!("failed to listen for shutdown signal: {e}");
            // Without a signal handler the server just runs until killed.
            std::future::pending::<()>().await;
        }
    }
}
