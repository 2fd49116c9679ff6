//! Features Module - Feature Extraction Engine
//!
//! Turns controller flow entries and prediction requests into the named
//! feature vector the classifier was trained on.

pub mod layout;
pub mod vector;
pub mod extract;

// Re-export common types
pub use layout::{FeatureSchema, LayoutInfo};
pub use vector::FeatureVector;
pub use extract::{FeatureExtractor, FlowObservation, FlowRecord};
