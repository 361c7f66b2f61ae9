//! API Error Types

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use grading::{GradeSummary, ValidationReport};
use serde_json::json;
use storage::StorageError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Invalid result: {0}")]
    Validation(#[from] ValidationReport),

    #[error("Derived fields do not match the marks (expected total {}, average {}, grade {})", .expected.total, .expected.average, .expected.grade)]
    Inconsistent {
        expected: GradeSummary,
        supplied: GradeSummary,
    },

    /// Body or path that could not be decoded at all
    #[error("{message}")]
    Malformed { status: StatusCode, message: String },

    #[error("Metrics exporter is not enabled")]
    MetricsDisabled,

    #[error("Unexpected store response to {0}")]
    UnexpectedResponse(&'static str),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Malformed {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Malformed {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match &self {
            ApiError::Storage(StorageError::NotFound(_)) | ApiError::MetricsDisabled => {
                (StatusCode::NOT_FOUND, json!({ "error": message }))
            }
            ApiError::Validation(report) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": message, "fields": report.field_errors() }),
            ),
            ApiError::Malformed { status, .. } => (*status, json!({ "error": message })),
            ApiError::Inconsistent { expected, supplied } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": message, "expected": expected, "supplied": supplied }),
            ),
            ApiError::Storage(_) | ApiError::UnexpectedResponse(_) => {
                error!("Request failed: {message}");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": message }))
            }
        };
        (status, Json(body)).into_response()
    }
}
