//! Startup Artifacts
//!
//! Loads the four files the offline trainer produces and checks they
//! describe the same feature layout. Any failure here is fatal: the service
//! never runs without a model.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::classifier::{LabelDecoder, ModelHandle};
use super::forest::ForestModel;
use super::normalizer::{describe_mismatch, Scaler, ScalerParams};
use crate::logic::error::{IdsError, Result};
use crate::logic::features::FeatureSchema;

pub const NUMERIC_COLS_FILE: &str = "numeric_cols.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const MODEL_FILE: &str = "model.json";
pub const LABEL_ENCODER_FILE: &str = "label_encoder.json";

#[derive(Debug, Deserialize)]
struct LabelEncoderFile {
    classes: Vec<String>,
}

/// Everything loaded at startup, aligned on one feature layout
#[derive(Debug)]
pub struct Artifacts {
    pub schema: FeatureSchema,
    pub scaler: Scaler,
    pub model: ModelHandle,
}

impl Artifacts {
    /// Cross-check the pieces; the column list is the reference layout
    pub fn assemble(schema: FeatureSchema, scaler: Scaler, model: ModelHandle) -> Result<Self> {
        if scaler.feature_names() != schema.names() {
            return Err(IdsError::ArtifactLoad(format!(
                "scaler was fit on a different layout: {}",
                describe_mismatch(schema.names(), scaler.feature_names())
            )));
        }
        if model.n_features() != schema.len() {
            return Err(IdsError::ArtifactLoad(format!(
                "model expects {} features, column list has {}",
                model.n_features(),
                schema.len()
            )));
        }

        Ok(Self { schema, scaler, model })
    }
}

/// Load and validate all artifacts from `dir`
pub fn load_artifacts(dir: &Path) -> Result<Artifacts> {
    tracing::info!("Loading model artifacts from {}", dir.display());

    let schema = load_schema(dir)?;

    let scaler = Scaler::from_params(read_json::<ScalerParams>(dir, SCALER_FILE)?)?;

    let forest: ForestModel = read_json(dir, MODEL_FILE)?;
    forest.validate()?;

    let encoder: LabelEncoderFile = read_json(dir, LABEL_ENCODER_FILE)?;
    let labels = LabelDecoder::new(encoder.classes)?;

    let model = ModelHandle::new("random_forest", Box::new(forest), labels)?;
    let artifacts = Artifacts::assemble(schema, scaler, model)?;

    tracing::info!(
        "Loaded artifacts: features={:?} classes={:?} layout_hash={:08x}",
        artifacts.schema.names(),
        artifacts.model.labels().classes(),
        artifacts.schema.hash()
    );

    Ok(artifacts)
}

/// Load only the column list; enough to extract features without a model
pub fn load_schema(dir: &Path) -> Result<FeatureSchema> {
    let names: Vec<String> = read_json(dir, NUMERIC_COLS_FILE)?;
    FeatureSchema::new(names)
}

fn read_json<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<T> {
    let path = dir.join(file);
    if !path.exists() {
        return Err(IdsError::ArtifactLoad(format!("{} not found", path.display())));
    }

    let data = fs::read(&path)
        .map_err(|e| IdsError::ArtifactLoad(format!("{}: {}", path.display(), e)))?;

    serde_json::from_slice(&data)
        .map_err(|e| IdsError::ArtifactLoad(format!("{}: {}", path.display(), e)))
}
