//! Classifier Wrapper
//!
//! Holds the trained model and its label decoder. Read-only after load;
//! inference statistics are plain atomics so concurrent callers never wait
//! on each other.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use ndarray::{Array1, ArrayView1};
use serde::Serialize;

use super::normalizer::NormalizedVector;
use crate::logic::error::{IdsError, Result};

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Trait for trained multi-class models
pub trait Classifier: Send + Sync {
    fn n_features(&self) -> usize;
    fn n_classes(&self) -> usize;

    /// Predicted class index
    fn predict(&self, x: ArrayView1<'_, f64>) -> usize;

    /// Posterior over classes, if the model can produce one
    fn predict_proba(&self, x: ArrayView1<'_, f64>) -> Option<Array1<f64>>;

    fn has_probabilities(&self) -> bool {
        true
    }
}

// ============================================================================
// LABEL DECODER
// ============================================================================

/// Class index ↔ label name, as in `label_encoder.json`
#[derive(Debug, Clone, Serialize)]
pub struct LabelDecoder {
    classes: Vec<String>,
}

impl LabelDecoder {
    pub fn new(classes: Vec<String>) -> Result<Self> {
        if classes.is_empty() {
            return Err(IdsError::ArtifactLoad("label encoder has no classes".to_string()));
        }
        Ok(Self { classes })
    }

    pub fn decode(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn contains(&self, label: &str) -> bool {
        self.classes.iter().any(|c| c == label)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// Output of one classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub label: String,
    /// Max posterior; `None` when the model exposes no probabilities
    pub confidence: Option<f64>,
}

/// Engine status for the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub model_kind: String,
    pub feature_count: usize,
    pub class_count: usize,
    pub probabilities: bool,
    pub inference_count: u64,
    pub avg_latency_us: f64,
}

// ============================================================================
// MODEL HANDLE
// ============================================================================

/// Trained model + label decoder, loaded once at startup
pub struct ModelHandle {
    kind: String,
    model: Box<dyn Classifier>,
    labels: LabelDecoder,
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("kind", &self.kind)
            .field("n_features", &self.model.n_features())
            .field("labels", &self.labels)
            .finish()
    }
}

impl ModelHandle {
    /// Wrap a model; class count must match the decoder
    pub fn new(kind: impl Into<String>, model: Box<dyn Classifier>, labels: LabelDecoder) -> Result<Self> {
        if model.n_classes() != labels.len() {
            return Err(IdsError::ArtifactLoad(format!(
                "model predicts {} classes but label encoder has {}",
                model.n_classes(),
                labels.len()
            )));
        }

        Ok(Self {
            kind: kind.into(),
            model,
            labels,
            latency_sum_us: AtomicU64::new(0),
            inference_count: AtomicU64::new(0),
        })
    }

    pub fn labels(&self) -> &LabelDecoder {
        &self.labels
    }

    pub fn n_features(&self) -> usize {
        self.model.n_features()
    }

    pub fn classify(&self, input: &NormalizedVector) -> Result<ClassificationResult> {
        if input.len() != self.model.n_features() {
            return Err(IdsError::SchemaMismatch(format!(
                "model expects {} features, got {}",
                self.model.n_features(),
                input.len()
            )));
        }

        let start = Instant::now();
        let x = input.view();

        let index = self.model.predict(x);
        let confidence = self
            .model
            .predict_proba(x)
            .map(|proba| proba.iter().copied().fold(0.0, f64::max));

        let label = self.labels.decode(index).ok_or_else(|| {
            IdsError::SchemaMismatch(format!("model predicted unknown class index {}", index))
        })?;

        self.latency_sum_us
            .fetch_add(start.elapsed().as_micros() as u64, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        Ok(ClassificationResult {
            label: label.to_string(),
            confidence,
        })
    }

    pub fn status(&self) -> EngineStatus {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);
        let avg = if count > 0 { sum as f64 / count as f64 } else { 0.0 };

        EngineStatus {
            model_kind: self.kind.clone(),
            feature_count: self.model.n_features(),
            class_count: self.labels.len(),
            probabilities: self.model.has_probabilities(),
            inference_count: count,
            avg_latency_us: avg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::FeatureVector;
    use crate::logic::model::normalizer::{Scaler, ScalerParams};

    /// Picks class 1 when the first input is positive
    struct SignModel {
        probabilities: bool,
    }

    impl Classifier for SignModel {
        fn n_features(&self) -> usize {
            1
        }
        fn n_classes(&self) -> usize {
            2
        }
        fn predict(&self, x: ArrayView1<'_, f64>) -> usize {
            usize::from(x[0] > 0.0)
        }
        fn predict_proba(&self, x: ArrayView1<'_, f64>) -> Option<Array1<f64>> {
            self.probabilities
                .then(|| if x[0] > 0.0 { ndarray::array![0.25, 0.75] } else { ndarray::array![0.6, 0.4] })
        }
        fn has_probabilities(&self) -> bool {
            self.probabilities
        }
    }

    fn labels() -> LabelDecoder {
        LabelDecoder::new(vec!["BENIGN".to_string(), "DDoS".to_string()]).unwrap()
    }

    fn normalized(value: f64) -> NormalizedVector {
        let scaler = Scaler::from_params(ScalerParams {
            feature_names: vec!["Flow Duration".to_string()],
            offset: vec![0.0],
            scale: vec![1.0],
        })
        .unwrap();
        scaler
            .normalize(&FeatureVector::from_pairs([("Flow Duration", value)]))
            .unwrap()
    }

    #[test]
    fn test_confidence_is_max_posterior() {
        let handle = ModelHandle::new("test", Box::new(SignModel { probabilities: true }), labels()).unwrap();

        let result = handle.classify(&normalized(3.0)).unwrap();
        assert_eq!(result.label, "DDoS");
        assert_eq!(result.confidence, Some(0.75));

        let result = handle.classify(&normalized(-3.0)).unwrap();
        assert_eq!(result.label, "BENIGN");
        assert_eq!(result.confidence, Some(0.6));
    }

    #[test]
    fn test_confidence_absent_without_probabilities() {
        let handle = ModelHandle::new("test", Box::new(SignModel { probabilities: false }), labels()).unwrap();
        let result = handle.classify(&normalized(3.0)).unwrap();
        assert_eq!(result.label, "DDoS");
        assert_eq!(result.confidence, None);
        assert!(!handle.status().probabilities);
    }

    #[test]
    fn test_class_count_must_match_decoder() {
        let decoder = LabelDecoder::new(vec!["BENIGN".to_string()]).unwrap();
        let result = ModelHandle::new("test", Box::new(SignModel { probabilities: true }), decoder);
        assert!(matches!(result, Err(IdsError::ArtifactLoad(_))));
    }

    #[test]
    fn test_status_counts_inferences() {
        let handle = ModelHandle::new("test", Box::new(SignModel { probabilities: true }), labels()).unwrap();
        for i in 0..3 {
            handle.classify(&normalized(i as f64)).unwrap();
        }
        let status = handle.status();
        assert_eq!(status.inference_count, 3);
        assert_eq!(status.class_count, 2);
        assert!(status.probabilities);
    }

    #[test]
    fn test_decoder_lookup() {
        let decoder = labels();
        assert_eq!(decoder.decode(1), Some("DDoS"));
        assert_eq!(decoder.decode(2), None);
        assert!(decoder.contains("BENIGN"));
        assert!(!decoder.contains("benign"));
        assert!(LabelDecoder::new(Vec::new()).is_err());
    }
}
