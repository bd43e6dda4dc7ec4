//! Control-surface endpoints: override, sync, lights, refresh.
//!
//! These are the immediate-dispatch path: each call interrupts the
//! evaluator's wait and takes effect before the response is sent.

use axum::{
    Json, Router,
    extract::State,
    routing::{post, put},
};
use serde::Deserialize;

use crate::engine::StatusReport;
use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/override", put(set_override).delete(clear_override))
        .route("/sync", put(set_sync))
        .route("/lights", put(set_lights))
        .route("/refresh", post(refresh))
        .route("/lights/test", post(test_lights))
}

#[derive(Deserialize)]
pub struct OverrideRequest {
    pub tag: String,
}

#[derive(Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

/// PUT /override - Pin a manual status
async fn set_override(
    State(state): State<AppState>,
    Json(req): Json<OverrideRequest>,
) -> Result<Json<StatusReport>, AppError> {
    Ok(Json(state.set_override(req.tag).await?))
}

/// DELETE /override - Return authority to the calendar
async fn clear_override(State(state): State<AppState>) -> Result<Json<StatusReport>, AppError> {
    Ok(Json(state.clear_override().await?))
}

/// PUT /sync - Enable or disable calendar sync
async fn set_sync(
    State(state): State<AppState>,
    Json(req): Json<ToggleRequest>,
) -> Result<Json<StatusReport>, AppError> {
    Ok(Json(state.set_sync(req.enabled).await?))
}

/// PUT /lights - Enable or disable light control
async fn set_lights(
    State(state): State<AppState>,
    Json(req): Json<ToggleRequest>,
) -> Result<Json<StatusReport>, AppError> {
    Ok(Json(state.set_lights(req.enabled).await?))
}

/// POST /refresh - Re-evaluate now instead of waiting for the next tick
async fn refresh(State(state): State<AppState>) -> Result<Json<StatusReport>, AppError> {
    Ok(Json(state.refresh_now().await?))
}

/// POST /lights/test - Cycle the test palette on the device
async fn test_lights(State(state): State<AppState>) -> Result<Json<()>, AppError> {
    state.test_lights().await?;
    Ok(Json(()))
}
