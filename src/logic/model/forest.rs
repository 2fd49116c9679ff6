//! Tree Ensemble - natively evaluated random forest
//!
//! The offline trainer exports every fitted tree as flat node arrays (the
//! usual `children_left / children_right / feature / threshold / value`
//! layout). A sample goes left when `x[feature] <= threshold`; a node whose
//! `children_left` is -1 is a leaf and `value` holds its class weights.
//!
//! Soft voting averages the normalized leaf distributions (probabilities are
//! available). Hard voting counts one vote per tree for its leaf argmax and
//! exposes no probabilities.

use ndarray::{Array1, ArrayView1};
use serde::Deserialize;

use super::classifier::Classifier;
use crate::logic::error::{IdsError, Result};

const LEAF: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Voting {
    #[default]
    Soft,
    Hard,
}

/// One fitted tree in flat array form
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

/// Forest as serialized in `model.json`
#[derive(Debug, Clone, Deserialize)]
pub struct ForestModel {
    pub n_features: usize,
    pub n_classes: usize,
    #[serde(default)]
    pub voting: Voting,
    pub trees: Vec<DecisionTree>,
}

impl DecisionTree {
    fn validate(&self, index: usize, n_features: usize, n_classes: usize) -> Result<()> {
        let n = self.children_left.len();
        let err = |msg: String| IdsError::ArtifactLoad(format!("tree {}: {}", index, msg));

        if n == 0 {
            return Err(err("no nodes".to_string()));
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err(err("node arrays have different lengths".to_string()));
        }

        for node in 0..n {
            let left = self.children_left[node];
            let right = self.children_right[node];

            if left == LEAF {
                let row = &self.value[node];
                if row.len() != n_classes {
                    return Err(err(format!(
                        "leaf {} has {} class weights, expected {}", node, row.len(), n_classes
                    )));
                }
                if row.iter().any(|w| !w.is_finite() || *w < 0.0) {
                    return Err(err(format!("leaf {} has invalid class weights", node)));
                }
                continue;
            }

            // Children must point forward; this also rules out cycles
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(err(format!("node {} has child {} out of range", node, child)));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(err(format!("node {} splits on feature {}", node, feature)));
            }
            if self.threshold[node].is_nan() {
                return Err(err(format!("node {} has NaN threshold", node)));
            }
        }

        Ok(())
    }

    /// Class weights of the leaf `x` falls into
    fn leaf(&self, x: ArrayView1<'_, f64>) -> &[f64] {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let feature = self.feature[node] as usize;
            node = if x[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        &self.value[node]
    }
}

impl ForestModel {
    pub fn validate(&self) -> Result<()> {
        if self.n_features == 0 || self.n_classes == 0 {
            return Err(IdsError::ArtifactLoad(
                "model declares zero features or classes".to_string(),
            ));
        }
        if self.trees.is_empty() {
            return Err(IdsError::ArtifactLoad("model has no trees".to_string()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, self.n_features, self.n_classes)?;
        }
        Ok(())
    }

    fn soft_vote(&self, x: ArrayView1<'_, f64>) -> Array1<f64> {
        let mut proba = Array1::<f64>::zeros(self.n_classes);

        for tree in &self.trees {
            let leaf = ArrayView1::from(tree.leaf(x));
            let total = leaf.sum();
            if total > 0.0 {
                proba.scaled_add(1.0 / total, &leaf);
            }
        }

        let total = proba.sum();
        if total > 0.0 {
            proba /= total;
        }
        proba
    }

    fn hard_vote(&self, x: ArrayView1<'_, f64>) -> usize {
        let mut votes = vec![0usize; self.n_classes];
        for tree in &self.trees {
            votes[argmax(ArrayView1::from(tree.leaf(x)))] += 1;
        }
        argmax(ArrayView1::from(&votes[..]).mapv(|v| v as f64).view())
    }
}

impl Classifier for ForestModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict(&self, x: ArrayView1<'_, f64>) -> usize {
        match self.voting {
            Voting::Soft => argmax(self.soft_vote(x).view()),
            Voting::Hard => self.hard_vote(x),
        }
    }

    fn predict_proba(&self, x: ArrayView1<'_, f64>) -> Option<Array1<f64>> {
        match self.voting {
            Voting::Soft => Some(self.soft_vote(x)),
            Voting::Hard => None,
        }
    }

    fn has_probabilities(&self) -> bool {
        self.voting == Voting::Soft
    }
}

/// Index of the largest value; ties go to the lowest index
pub fn argmax(values: ArrayView1<'_, f64>) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
