//! Error types for the bookshop backend
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::jobs::JobId;

// == App Error Enum ==
/// Error type returned by services and HTTP handlers.
#[derive(Error, Debug)]
pub enum AppError {
    /// Requested record or artifact does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Write conflicts with existing data
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Job Error Enum ==
/// Failure of a background job. Every variant ends the job as FAILED.
#[derive(Error, Debug)]
pub enum JobError {
    /// No source log file existed in the requested range
    #[error("no log files found between {start} and {end}")]
    NoSourceFiles { start: String, end: String },

    /// Reading sources or writing the artifact failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The job observed a cancellation request
    #[error("job was cancelled")]
    Cancelled,

    /// The job's task panicked or was aborted
    #[error("job task failed: {0}")]
    Panicked(String),
}

// == Artifact Error Enum ==
/// Failure to hand out a job's artifact.
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// The job is unknown, still running, or failed
    #[error("artifact for job {0} is not ready or does not exist")]
    NotReady(JobId),

    /// The job is ready but its artifact could not be read
    #[error("failed to read artifact: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ArtifactError> for AppError {
    fn from(err: ArtifactError) -> Self {
        let message = err.to_string();
        match err {
            ArtifactError::NotReady(_) => AppError::NotFound(message),
            ArtifactError::Io(_) => AppError::Internal(message),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the bookshop backend.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_error_status_codes() {
        let test_cases = vec![
            (AppError::NotFound("author 1".to_string()), StatusCode::NOT_FOUND),
            (AppError::InvalidRequest("bad".to_string()), StatusCode::BAD_REQUEST),
            (AppError::Conflict("dup".to_string()), StatusCode::CONFLICT),
            (AppError::Internal("error".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected_status) in test_cases {
            let response = error.into_response();
            assert_eq!(response.status(), expected_status);
        }
    }

    #[tokio::test]
    async fn test_error_body_is_json() {
        let response = AppError::NotFound("book 7".to_string()).into_response();

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["error"], "Not found: book 7");
    }

    #[test]
    fn test_artifact_error_mapping() {
        let id = JobId::new();
        assert!(matches!(
            AppError::from(ArtifactError::NotReady(id)),
            AppError::NotFound(_)
        ));

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert!(matches!(
            AppError::from(ArtifactError::Io(io)),
            AppError::Internal(_)
        ));
    }
}
