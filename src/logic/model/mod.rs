//! Model Module - Trained Classifier
//!
//! Scaler, tree-ensemble classifier, label decoder and the startup loader
//! that ties them to one feature layout.

pub mod normalizer;
pub mod forest;
pub mod classifier;
pub mod artifacts;

pub use classifier::EngineStatus;
pub use artifacts::{load_artifacts, load_schema};
