//! Status endpoint

use axum::{Json, Router, extract::State, routing::get};

use crate::engine::StatusReport;
use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/status", get(status))
}

/// GET /status - Current resolved status and engine switches
async fn status(State(state): State<AppState>) -> Result<Json<StatusReport>, AppError> {
    Ok(Json(state.status().await?))
}
