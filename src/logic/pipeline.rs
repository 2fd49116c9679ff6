//! Inference pipeline: extract → normalize → classify → decide.
//!
//! Built once at startup and shared read-only by the polling task and the
//! HTTP handlers.

use crate::logic::decision::{DecisionPolicy, NetworkState, Verdict};
use crate::logic::error::Result;
use crate::logic::features::{FeatureExtractor, FeatureSchema, FeatureVector, FlowRecord};
use crate::logic::model::artifacts::Artifacts;
use crate::logic::model::classifier::{ClassificationResult, ModelHandle};
use crate::logic::model::normalizer::Scaler;
use crate::logic::source::FlowBatch;
use crate::models::{PredictRequest, PredictResponse};

/// Verdicts of one polled batch
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub verdicts: Vec<Verdict>,
    pub state: NetworkState,
    /// Records dropped as malformed; not part of `state.total_flows`
    pub skipped: usize,
}

pub struct Pipeline {
    extractor: FeatureExtractor,
    scaler: Scaler,
    model: ModelHandle,
    policy: DecisionPolicy,
}

impl Pipeline {
    pub fn new(artifacts: Artifacts, policy: DecisionPolicy) -> Self {
        Self {
            extractor: FeatureExtractor::new(artifacts.schema),
            scaler: artifacts.scaler,
            model: artifacts.model,
            policy,
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.extractor.schema()
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    /// Features and classification for one record
    pub fn evaluate<R: FlowRecord + ?Sized>(&self, record: &R) -> Result<(FeatureVector, ClassificationResult)> {
        let features = self.extractor.extract(record);
        let normalized = self.scaler.normalize(&features)?;
        let result = self.model.classify(&normalized)?;
        Ok((features, result))
    }

    /// Single-flow prediction for the HTTP service
    pub fn predict(&self, request: &PredictRequest) -> Result<PredictResponse> {
        let (features, result) = self.evaluate(request)?;
        let verdict = self.policy.single_verdict(
            request.flow_id.clone(),
            request.device_id.clone(),
            &result,
        );

        Ok(PredictResponse {
            label: verdict.label,
            is_attack: verdict.is_attack,
            confidence: verdict.confidence,
            features_used: features,
        })
    }

    /// Classify every well-formed record of a batch and aggregate.
    ///
    /// Malformed records are skipped; fatal errors abort the batch.
    pub fn classify_batch(&self, batch: FlowBatch) -> Result<BatchOutcome> {
        let mut verdicts = Vec::with_capacity(batch.len());
        let mut skipped = 0;

        for item in batch {
            let flow = match item {
                Ok(flow) => flow,
                Err(e) => {
                    tracing::warn!("Skipping flow: {}", e);
                    skipped += 1;
                    continue;
                }
            };

            match self.evaluate(&flow) {
                Ok((_, result)) => {
                    let tuple = flow.tuple();
                    let verdict = self.policy.single_verdict(flow.id, flow.device_id, &result);
                    verdicts.push(verdict.with_flow(tuple));
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!("Skipping flow {:?}: {}", flow.id, e);
                    skipped += 1;
                }
            }
        }

        let state = self.policy.aggregate(&verdicts);
        Ok(BatchOutcome { verdicts, state, skipped })
    }
}
