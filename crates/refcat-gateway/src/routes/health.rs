//! Health check endpoint.

use axum::{extract::State, routing::get, Json, Router};

use crate::json::HealthResponse;
use crate::AppState;

/// Health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    // Try to open a storage session
    let storage_connected = state
        .run_blocking(|service| service.store().session().map(drop))
        .await
        .is_ok();

    Json(HealthResponse {
        status: if storage_connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage_connected,
        models: state.service.registry().len(),
    })
}
