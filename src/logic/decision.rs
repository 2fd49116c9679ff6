//! Decision Engine
//!
//! Two attack rules live here and stay separate:
//! - single flow: a label is an attack unless it is in the benign-label set
//! - batch: a flow counts as an attack when its label is not the baseline label
//!
//! A vocabulary with several benign spellings ("BENIGN", "Benign") gives
//! different answers under the two rules; both are kept as they are.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::logic::error::{IdsError, Result};
use crate::logic::model::classifier::{ClassificationResult, LabelDecoder};
use crate::models::FlowTuple;

/// Labels treated as "no attack" when no override is configured
pub const DEFAULT_BENIGN_LABELS: &[&str] = &["BENIGN", "Benign", "benign", "NORMAL", "Normal", "normal"];

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Per-flow outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub flow_id: Option<String>,
    pub device_id: Option<String>,
    pub label: String,
    pub is_attack: bool,
    pub confidence: Option<f64>,
    pub flow: FlowTuple,
}

impl Verdict {
    pub fn with_flow(mut self, flow: FlowTuple) -> Self {
        self.flow = flow;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkStatus {
    Normal,
    UnderAttack,
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkStatus::Normal => write!(f, "NORMAL"),
            NetworkStatus::UnderAttack => write!(f, "UNDER ATTACK"),
        }
    }
}

/// Network-wide state derived from one batch of verdicts.
///
/// Counts cover classified flows only; records dropped as malformed before
/// classification are reported next to the state (`skipped_flows` on a
/// snapshot), not in `total_flows`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkState {
    pub status: NetworkStatus,
    /// Flows that were classified
    pub total_flows: usize,
    /// Classified flows whose label is not the baseline
    pub attack_flows: usize,
}

impl NetworkState {
    pub fn empty() -> Self {
        Self {
            status: NetworkStatus::Normal,
            total_flows: 0,
            attack_flows: 0,
        }
    }
}

// ============================================================================
// POLICY
// ============================================================================

#[derive(Debug, Clone)]
pub struct DecisionPolicy {
    benign_labels: BTreeSet<String>,
    baseline_label: String,
}

impl DecisionPolicy {
    pub fn new<I, S>(benign_labels: I, baseline_label: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            benign_labels: benign_labels.into_iter().map(Into::into).collect(),
            baseline_label: baseline_label.into(),
        }
    }

    /// Default benign set with the given baseline
    #[cfg(test)]
    pub fn with_defaults(baseline_label: impl Into<String>) -> Self {
        Self::new(DEFAULT_BENIGN_LABELS.iter().copied(), baseline_label)
    }

    /// Build a policy checked against the model's label vocabulary.
    ///
    /// The baseline must name a class the model can predict. Without an
    /// explicit baseline, the first vocabulary label in the benign set is used.
    pub fn for_vocabulary(
        benign_labels: Vec<String>,
        baseline_label: Option<String>,
        vocabulary: &LabelDecoder,
    ) -> Result<Self> {
        let benign: BTreeSet<String> = benign_labels.into_iter().collect();

        let baseline = match baseline_label {
            Some(label) => {
                if !vocabulary.contains(&label) {
                    return Err(IdsError::Config(format!(
                        "baseline label {:?} is not one of the model classes {:?}",
                        label,
                        vocabulary.classes()
                    )));
                }
                label
            }
            None => vocabulary
                .classes()
                .iter()
                .find(|c| benign.contains(c.as_str()))
                .cloned()
                .ok_or_else(|| {
                    IdsError::Config(format!(
                        "no model class {:?} is in the benign set {:?}; set the baseline label explicitly",
                        vocabulary.classes(),
                        benign
                    ))
                })?,
        };

        if !vocabulary.classes().iter().any(|c| benign.contains(c.as_str())) {
            tracing::warn!(
                "No model class is in the benign set; every single-flow prediction will be an attack"
            );
        }

        Ok(Self::new(benign, baseline))
    }

    pub fn baseline_label(&self) -> &str {
        &self.baseline_label
    }

    pub fn benign_labels(&self) -> impl Iterator<Item = &str> {
        self.benign_labels.iter().map(String::as_str)
    }

    /// Exact, case-sensitive membership in the benign set
    pub fn is_benign(&self, label: &str) -> bool {
        self.benign_labels.contains(label)
    }

    /// Exact identity with the baseline label
    pub fn is_baseline(&self, label: &str) -> bool {
        label == self.baseline_label
    }

    pub fn single_verdict(
        &self,
        flow_id: Option<String>,
        device_id: Option<String>,
        result: &ClassificationResult,
    ) -> Verdict {
        Verdict {
            flow_id,
            device_id,
            label: result.label.clone(),
            is_attack: !self.is_benign(&result.label),
            confidence: result.confidence,
            flow: FlowTuple::default(),
        }
    }

    pub fn aggregate(&self, verdicts: &[Verdict]) -> NetworkState {
        let attack_flows = verdicts
            .iter()
            .filter(|v| !self.is_baseline(&v.label))
            .count();

        NetworkState {
            status: if attack_flows > 0 {
                NetworkStatus::UnderAttack
            } else {
                NetworkStatus::Normal
            },
            total_flows: verdicts.len(),
            attack_flows,
        }
    }
}
