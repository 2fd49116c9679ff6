//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::logic::error::IdsError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Request errors
    BadRequest(String),

    // Resource errors
    NotFound(String),

    // Nothing to serve yet, or the controller is unreachable
    Unavailable(String),

    // Model/layout disagreement
    SchemaMismatch(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.as_str()),
            AppError::SchemaMismatch(msg) => {
                tracing::error!("Schema mismatch: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Feature schema mismatch")
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<IdsError> for AppError {
    fn from(err: IdsError) -> Self {
        match err {
            IdsError::MalformedInput(_) | IdsError::MalformedResponse(_) => {
                AppError::BadRequest(err.to_string())
            }
            IdsError::SourceUnavailable(_) => AppError::Unavailable(err.to_string()),
            IdsError::SchemaMismatch(msg) => AppError::SchemaMismatch(msg),
            IdsError::ArtifactLoad(_) | IdsError::Config(_) => AppError::InternalError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let (status, body) = body_of(AppError::BadRequest("bad field".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad field");
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_schema_mismatch_hides_detail() {
        let err = AppError::from(IdsError::SchemaMismatch("missing Flow Pkts/s".into()));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Feature schema mismatch");
    }

    #[test]
    fn test_ids_error_mapping() {
        assert!(matches!(
            AppError::from(IdsError::MalformedInput("x".into())),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            AppError::from(IdsError::SourceUnavailable("x".into())),
            AppError::Unavailable(_)
        ));
    }
}
