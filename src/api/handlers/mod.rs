//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Chat turn handler.
pub mod chat;
/// Persona catalog handler.
pub mod personas;
/// Session lifecycle and persona switching handlers.
pub mod sessions;

use crate::{types::HealthResponse, AppState};
use axum::{extract::State, Json};

/// Liveness probe with the active model and storage state
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Server is up", body = HealthResponse)),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let orchestrator = &state.orchestrator;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: orchestrator.model_name().to_string(),
        storage_degraded: orchestrator.store().is_degraded(),
    })
}
