//! Normalizer - stored per-feature affine transform
//!
//! `(value - offset) / scale`, with the parameters fit offline next to the
//! classifier. The scaler remembers the feature names it was fit on and
//! refuses any vector laid out differently.

use std::collections::HashSet;
use std::sync::Arc;

use ndarray::{Array1, ArrayView1};
use serde::Deserialize;

use crate::logic::error::{IdsError, Result};
use crate::logic::features::layout::compute_layout_hash;
use crate::logic::features::FeatureVector;

/// Scaler parameters as exported by the training pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct ScalerParams {
    pub feature_names: Vec<String>,
    pub offset: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Loaded, validated scaler
#[derive(Debug, Clone)]
pub struct Scaler {
    feature_names: Arc<[String]>,
    layout_hash: u32,
    offset: Array1<f64>,
    scale: Array1<f64>,
}

/// Scaler output; same names and order as the input vector
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedVector {
    names: Arc<[String]>,
    values: Array1<f64>,
}

impl NormalizedVector {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn view(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl Scaler {
    pub fn from_params(params: ScalerParams) -> Result<Self> {
        let n = params.feature_names.len();
        if n == 0 {
            return Err(IdsError::ArtifactLoad("scaler has no features".to_string()));
        }
        if params.offset.len() != n || params.scale.len() != n {
            return Err(IdsError::ArtifactLoad(format!(
                "scaler size mismatch: {} names, {} offsets, {} scales",
                n,
                params.offset.len(),
                params.scale.len()
            )));
        }
        if params.offset.iter().chain(params.scale.iter()).any(|v| !v.is_finite()) {
            return Err(IdsError::ArtifactLoad("scaler contains non-finite parameters".to_string()));
        }

        // Constant features were fit with scale 0; the trainer divides by 1 there
        let scale = params
            .scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect::<Array1<f64>>();

        let layout_hash = compute_layout_hash(&params.feature_names);

        Ok(Self {
            feature_names: params.feature_names.into(),
            layout_hash,
            offset: Array1::from(params.offset),
            scale,
        })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn layout_hash(&self) -> u32 {
        self.layout_hash
    }

    pub fn normalize(&self, vector: &FeatureVector) -> Result<NormalizedVector> {
        if vector.layout_hash() != self.layout_hash || vector.names() != &self.feature_names[..] {
            return Err(IdsError::SchemaMismatch(describe_mismatch(
                &self.feature_names,
                vector.names(),
            )));
        }

        let raw = ArrayView1::from(vector.values());
        let values = (&raw - &self.offset) / &self.scale;

        Ok(NormalizedVector {
            names: Arc::clone(&self.feature_names),
            values,
        })
    }
}

/// Human-readable difference between two name lists
pub(crate) fn describe_mismatch(expected: &[String], actual: &[String]) -> String {
    let expected_set: HashSet<&str> = expected.iter().map(String::as_str).collect();
    let actual_set: HashSet<&str> = actual.iter().map(String::as_str).collect();

    let missing: Vec<&str> = expected
        .iter()
        .map(String::as_str)
        .filter(|n| !actual_set.contains(n))
        .collect();
    let extra: Vec<&str> = actual
        .iter()
        .map(String::as_str)
        .filter(|n| !expected_set.contains(n))
        .collect();

    if missing.is_empty() && extra.is_empty() {
        format!("feature order differs: expected {:?}, got {:?}", expected, actual)
    } else {
        format!("missing features {:?}, unexpected features {:?}", missing, extra)
    }
}
