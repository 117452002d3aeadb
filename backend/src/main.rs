// main.rs

mod config;
mod dimacs;
mod solver;
mod solver_task;
mod state;
mod web;

use crate::config::ServerConfig;
use crate::solver_task::solver_task;
use crate::state::AppState;
use anyhow::Context;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(?config, "starting");

    // --- Channels ---
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (ws_tx, _ws_rx) = broadcast::channel(512);

    let state = Arc::new(AppState {
        cmd_tx,
        ws_tx,
        static_dir: config.static_dir.clone(),
    });

    // --- Background tasks ---
    let _solver_handle = tokio::spawn(solver_task(
        state.clone(),
        config.cnf_path.clone(),
        config.tick,
        cmd_rx,
    ));

    // --- HTTP + WebSocket ---
    let app = web::router(state);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!("satview listening on http://{}", config.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
