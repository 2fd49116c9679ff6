//! Prediction request/response models

use serde::{Deserialize, Serialize};

use super::flow::deserialize_flow_id;
use crate::logic::features::{FeatureVector, FlowObservation, FlowRecord};

/// Flow description sent by the controller or a client.
///
/// Unknown keys are ignored, so controller payloads carrying extra match
/// fields (`last_seen`, `in_port`, ...) are accepted as-is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictRequest {
    pub src_ip: Option<String>,
    pub dst_ip: Option<String>,
    pub src_port: Option<u16>,
    pub dst_port: Option<u16>,
    pub protocol: Option<u8>,
    pub byte_count: Option<f64>,
    pub packet_count: Option<f64>,
    pub duration_sec: Option<f64>,
    pub device_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flow_id")]
    pub flow_id: Option<String>,
}

impl FlowRecord for PredictRequest {
    fn observation(&self) -> FlowObservation {
        FlowObservation {
            life: None,
            duration_seconds: self.duration_sec,
            packets: self.packet_count,
            bytes: self.byte_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictResponse {
    pub label: String,
    pub is_attack: bool,
    pub confidence: Option<f64>,
    /// The exact vector the model saw, in model order
    pub features_used: FeatureVector,
}
