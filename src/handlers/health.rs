//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct ModelSummary {
    features: Vec<String>,
    classes: Vec<String>,
    layout_hash: String,
    baseline_label: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    model: ModelSummary,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let pipeline = &state.pipeline;
    let schema = pipeline.schema();

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
        model: ModelSummary {
            features: schema.names().to_vec(),
            classes: pipeline.model().labels().classes().to_vec(),
            layout_hash: format!("{:08x}", schema.hash()),
            baseline_label: pipeline.policy().baseline_label().to_string(),
        },
    })
}
