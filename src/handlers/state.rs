//! Latest network state and detections

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::logic::board::{Detection, Snapshot};
use crate::{AppError, AppResult, AppState};

fn latest(state: &AppState) -> AppResult<std::sync::Arc<Snapshot>> {
    state
        .board
        .latest()
        .ok_or_else(|| AppError::NotFound("No polling cycle has completed yet".to_string()))
}

/// Latest snapshot: state and per-flow verdicts
pub async fn current(State(state): State<AppState>) -> AppResult<Response> {
    let snapshot = latest(&state)?;
    Ok(Json(&*snapshot).into_response())
}

/// Detections of the latest snapshot
pub async fn detections(State(state): State<AppState>) -> AppResult<Response> {
    let snapshot = latest(&state)?;

    Ok(Json(json!({
        "polled_at": snapshot.polled_at,
        "baseline_label": snapshot.baseline_label,
        "count": snapshot.detections.len(),
        "detections": snapshot.detections,
    }))
    .into_response())
}

/// Get single detection
pub async fn detection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Detection>> {
    let id: Uuid = id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid detection id: {}", id)))?;

    let detection = state
        .board
        .detection(id)
        .ok_or_else(|| AppError::NotFound("Detection not found".to_string()))?;

    Ok(Json(detection))
}
