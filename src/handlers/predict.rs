//! Single-flow prediction handler

use axum::{extract::{rejection::JsonRejection, State}, Json};

use crate::logic::error::IdsError;
use crate::models::{PredictRequest, PredictResponse};
use crate::{AppError, AppResult, AppState};

/// Classify one flow description
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> AppResult<Json<PredictResponse>> {
    let Json(request) = payload
        .map_err(|rejection| AppError::from(IdsError::MalformedInput(rejection.body_text())))?;

    let response = state.pipeline.predict(&request)?;

    tracing::debug!(
        flow_id = ?request.flow_id,
        device_id = ?request.device_id,
        "Predicted {} (attack={})",
        response.label,
        response.is_attack
    );

    Ok(Json(response))
}
