//! Engine status handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::logic::features::LayoutInfo;
use crate::logic::model::EngineStatus;
use crate::AppState;

#[derive(Serialize)]
pub struct EngineResponse {
    mode: String,
    poll_interval_secs: u64,
    engine: EngineStatus,
    layout: LayoutInfo,
    benign_labels: Vec<String>,
    baseline_label: String,
}

pub async fn status(State(state): State<AppState>) -> Json<EngineResponse> {
    let pipeline = &state.pipeline;

    Json(EngineResponse {
        mode: state.config.mode.to_string(),
        poll_interval_secs: state.config.poll_interval.as_secs(),
        engine: pipeline.model().status(),
        layout: pipeline.schema().info(),
        benign_labels: pipeline.policy().benign_labels().map(str::to_string).collect(),
        baseline_label: pipeline.policy().baseline_label().to_string(),
    })
}
