//! Local control endpoint.
//!
//! Runs on PORT (default 3000) and is what the restart chain signals first:
//! - `GET /health`   - liveness
//! - `GET /settings` - current settings as JSON
//! - `GET|POST /restart` - asks the composition root to shut down so the
//!   supervisor starts a fresh process

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use crate::storage::SettingsStore;

/// Shared state for the control server.
#[derive(Clone)]
struct ControlState {
    settings: Arc<SettingsStore>,
    restart: Arc<Notify>,
}

/// Builds the control router. `restart` is notified on every restart request.
pub fn router(settings: Arc<SettingsStore>, restart: Arc<Notify>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/settings", get(settings_handler))
        .route("/restart", get(restart_handler).post(restart_handler))
        .with_state(ControlState { settings, restart })
}

/// Serves the control endpoint until a restart is requested.
pub async fn start_control_server(port: u16, settings: Arc<SettingsStore>) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let restart = Arc::new(Notify::new());
    let app = router(settings, restart.clone());

    log::info!("Starting control server on http://{}", addr);
    log::info!("  /health    - Health check");
    log::info!("  /settings  - Current settings (JSON)");
    log::info!("  /restart   - Graceful restart");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            restart.notified().await;
            log::info!("Restart requested, shutting down control server");
        })
        .await?;

    Ok(())
}

async fn health_handler(State(state): State<ControlState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "session": state.settings.session_id(),
    }))
}

async fn settings_handler(State(state): State<ControlState>) -> impl IntoResponse {
    Json(state.settings.get_all())
}

async fn restart_handler(State(state): State<ControlState>) -> impl IntoResponse {
    log::info!("🔄 Restart signal received on control endpoint");
    state.restart.notify_one();
    (StatusCode::ACCEPTED, Json(json!({"status": "restarting"})))
}
