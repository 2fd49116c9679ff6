//! Shared test fixtures: a small trained-looking model over the canonical
//! layout and an in-memory flow source.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;

use crate::logic::decision::DecisionPolicy;
use crate::logic::error::{IdsError, Result};
use crate::logic::features::layout::KNOWN_FEATURES;
use crate::logic::features::FeatureSchema;
use crate::logic::model::artifacts::{
    Artifacts, LABEL_ENCODER_FILE, MODEL_FILE, NUMERIC_COLS_FILE, SCALER_FILE,
};
use crate::logic::model::classifier::{LabelDecoder, ModelHandle};
use crate::logic::model::forest::ForestModel;
use crate::logic::model::normalizer::{Scaler, ScalerParams};
use crate::logic::pipeline::Pipeline;
use crate::logic::source::{FlowBatch, FlowSource};

pub const CLASSES: &[&str] = &["BENIGN", "DDoS", "PortScan"];

/// One tree over the canonical layout with an identity scaler:
/// - `Flow Pkts/s` > 100 → DDoS (0.8)
/// - else `Tot Fwd Pkts` > 10000 → PortScan (0.9)
/// - else BENIGN (0.9)
pub fn model_json() -> serde_json::Value {
    json!({
        "n_features": 7,
        "n_classes": 3,
        "voting": "soft",
        "trees": [{
            "children_left":  [1, 2, -1, -1, -1],
            "children_right": [4, 3, -1, -1, -1],
            "feature":        [6, 1, -2, -2, -2],
            "threshold":      [100.0, 10000.0, -2.0, -2.0, -2.0],
            "value": [
                [0.0, 0.0, 0.0],
                [0.0, 0.0, 0.0],
                [9.0, 1.0, 0.0],
                [1.0, 0.0, 9.0],
                [0.0, 8.0, 2.0]
            ]
        }]
    })
}

pub fn scaler_json() -> serde_json::Value {
    json!({
        "feature_names": KNOWN_FEATURES,
        "offset": vec![0.0; KNOWN_FEATURES.len()],
        "scale": vec![1.0; KNOWN_FEATURES.len()],
    })
}

pub fn write_artifacts(dir: &Path) {
    let write = |file: &str, value: serde_json::Value| {
        fs::write(dir.join(file), serde_json::to_vec_pretty(&value).unwrap()).unwrap();
    };
    write(NUMERIC_COLS_FILE, json!(KNOWN_FEATURES));
    write(SCALER_FILE, scaler_json());
    write(MODEL_FILE, model_json());
    write(LABEL_ENCODER_FILE, json!({ "classes": CLASSES }));
}

pub fn artifacts() -> Artifacts {
    let scaler: ScalerParams = serde_json::from_value(scaler_json()).unwrap();
    let forest: ForestModel = serde_json::from_value(model_json()).unwrap();
    forest.validate().unwrap();
    let labels = LabelDecoder::new(CLASSES.iter().map(|s| s.to_string()).collect()).unwrap();

    Artifacts::assemble(
        FeatureSchema::canonical(),
        Scaler::from_params(scaler).unwrap(),
        ModelHandle::new("random_forest", Box::new(forest), labels).unwrap(),
    )
    .unwrap()
}

pub fn policy() -> DecisionPolicy {
    DecisionPolicy::with_defaults("BENIGN")
}

pub fn pipeline() -> Arc<Pipeline> {
    Arc::new(Pipeline::new(artifacts(), policy()))
}

/// Controller flow entry in ONOS JSON shape
pub fn onos_flow(id: &str, life: f64, packets: u64, bytes: u64) -> serde_json::Value {
    json!({
        "id": id,
        "deviceId": "of:0000000000000001",
        "life": life,
        "packets": packets,
        "bytes": bytes,
        "state": "ADDED",
    })
}

/// Flow source replaying queued responses, then failing
#[derive(Default)]
pub struct ScriptedSource {
    responses: Mutex<Vec<Result<serde_json::Value>>>,
}

impl ScriptedSource {
    pub fn new(mut responses: Vec<Result<serde_json::Value>>) -> Self {
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
        }
    }
}

impl FlowSource for ScriptedSource {
    async fn fetch(&self) -> Result<FlowBatch> {
        let next = self.responses.lock().pop();
        match next {
            Some(Ok(body)) => FlowBatch::from_body(body),
            Some(Err(e)) => Err(e),
            None => Err(IdsError::SourceUnavailable("script exhausted".to_string())),
        }
    }
}
