//! Pipeline error taxonomy

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdsError {
    /// Transport failure or non-success status from the controller
    #[error("flow source unavailable: {0}")]
    SourceUnavailable(String),

    /// Controller payload (or one record of it) does not have the agreed shape
    #[error("malformed controller response: {0}")]
    MalformedResponse(String),

    /// Prediction request could not be interpreted
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Feature vector does not match what the scaler/model were trained on
    #[error("feature schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Startup artifact missing, corrupt or inconsistent with the others
    #[error("artifact load failure: {0}")]
    ArtifactLoad(String),

    /// Configuration that contradicts the loaded artifacts
    #[error("configuration error: {0}")]
    Config(String),
}

impl IdsError {
    /// Errors that must stop processing instead of being retried or skipped
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            IdsError::SchemaMismatch(_) | IdsError::ArtifactLoad(_) | IdsError::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, IdsError>;
