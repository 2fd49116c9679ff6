//! Feature Layout - Canonical Feature Schema
//!
//! **This file controls the feature schema**
//!
//! The classifier was trained on an ordered list of numeric columns. That
//! list ships with the model artifacts and is loaded once at startup; it is
//! the layout every FeatureVector, the scaler and the model must agree on.
//!
//! ## Rules:
//! 1. Order comes from the loaded column list, never from code order
//! 2. Every listed name must be a feature the extractor can compute
//! 3. Layout hash = CRC32 over the names in order

use std::collections::HashSet;
use std::sync::Arc;

use crc32fast::Hasher;
use serde::Serialize;

use crate::logic::error::{IdsError, Result};

// ============================================================================
// CANONICAL FEATURE NAMES
// ============================================================================

pub const FLOW_DURATION: &str = "Flow Duration";
pub const TOT_FWD_PKTS: &str = "Tot Fwd Pkts";
pub const TOT_BWD_PKTS: &str = "Tot Bwd Pkts";
pub const TOTLEN_FWD_PKTS: &str = "TotLen Fwd Pkts";
pub const TOTLEN_BWD_PKTS: &str = "TotLen Bwd Pkts";
pub const FLOW_BYTS_S: &str = "Flow Byts/s";
pub const FLOW_PKTS_S: &str = "Flow Pkts/s";

/// Features the extractor knows how to compute, in training column naming
pub const KNOWN_FEATURES: &[&str] = &[
    FLOW_DURATION,
    TOT_FWD_PKTS,
    TOT_BWD_PKTS,
    TOTLEN_FWD_PKTS,
    TOTLEN_BWD_PKTS,
    FLOW_BYTS_S,
    FLOW_PKTS_S,
];

/// One computable flow feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowFeature {
    Duration,
    FwdPackets,
    BwdPackets,
    FwdBytes,
    BwdBytes,
    BytesPerSecond,
    PacketsPerSecond,
}

impl FlowFeature {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            FLOW_DURATION => Some(Self::Duration),
            TOT_FWD_PKTS => Some(Self::FwdPackets),
            TOT_BWD_PKTS => Some(Self::BwdPackets),
            TOTLEN_FWD_PKTS => Some(Self::FwdBytes),
            TOTLEN_BWD_PKTS => Some(Self::BwdBytes),
            FLOW_BYTS_S => Some(Self::BytesPerSecond),
            FLOW_PKTS_S => Some(Self::PacketsPerSecond),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Duration => FLOW_DURATION,
            Self::FwdPackets => TOT_FWD_PKTS,
            Self::BwdPackets => TOT_BWD_PKTS,
            Self::FwdBytes => TOTLEN_FWD_PKTS,
            Self::BwdBytes => TOTLEN_BWD_PKTS,
            Self::BytesPerSecond => FLOW_BYTS_S,
            Self::PacketsPerSecond => FLOW_PKTS_S,
        }
    }
}

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 over the feature names in order
pub fn compute_layout_hash<S: AsRef<str>>(names: &[S]) -> u32 {
    let mut hasher = Hasher::new();

    for name in names {
        hasher.update(name.as_ref().as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

// ============================================================================
// SCHEMA
// ============================================================================

/// Ordered feature layout loaded from the numeric column list
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    names: Arc<[String]>,
    features: Vec<FlowFeature>,
    hash: u32,
}

impl FeatureSchema {
    /// Build a schema from the trained column list.
    ///
    /// Fails on empty lists, duplicate names and names the extractor cannot
    /// compute; each of these means the artifacts do not belong to this build.
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(IdsError::ArtifactLoad("feature list is empty".to_string()));
        }

        let mut seen = HashSet::new();
        let mut features = Vec::with_capacity(names.len());

        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(IdsError::ArtifactLoad(format!(
                    "duplicate feature name in column list: {:?}", name
                )));
            }
            let feature = FlowFeature::from_name(name).ok_or_else(|| {
                IdsError::ArtifactLoad(format!(
                    "unknown feature {:?} (extractor computes {:?})", name, KNOWN_FEATURES
                ))
            })?;
            features.push(feature);
        }

        let hash = compute_layout_hash(&names);

        Ok(Self {
            names: names.into(),
            features,
            hash,
        })
    }

    /// All known features in their canonical order
    pub fn canonical() -> Self {
        let names: Vec<String> = KNOWN_FEATURES.iter().map(|s| s.to_string()).collect();
        let features = KNOWN_FEATURES
            .iter()
            .filter_map(|name| FlowFeature::from_name(name))
            .collect();
        let hash = compute_layout_hash(&names);

        Self {
            names: names.into(),
            features,
            hash,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Shared handle to the name list (vectors reference it instead of copying)
    pub fn shared_names(&self) -> Arc<[String]> {
        Arc::clone(&self.names)
    }

    pub fn features(&self) -> &[FlowFeature] {
        &self.features
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[cfg(test)]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn info(&self) -> LayoutInfo {
        LayoutInfo {
            hash: self.hash,
            feature_count: self.len(),
            feature_names: self.names.to_vec(),
        }
    }
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Layout description for health output and startup logs
#[derive(Debug, Clone, Serialize)]
pub struct LayoutInfo {
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

// ============================================================================
// TESTS
// ============================================================================
