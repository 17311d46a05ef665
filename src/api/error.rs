//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::prediction::PredictionError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_symptoms: Option<Vec<String>>,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid symptoms: {}", .0.join(", "))]
    InvalidSymptoms(Vec<String>),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, invalid_symptoms) = match self {
            ApiError::InvalidSymptoms(names) => (
                StatusCode::BAD_REQUEST,
                "INVALID_SYMPTOMS",
                format!(
                    "Invalid symptoms: {}. Use /predict/symptoms to get valid symptoms.",
                    names.join(", ")
                ),
                Some(names),
            ),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail, None),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail, None),
            ApiError::ServiceUnavailable(detail) => {
                tracing::warn!(detail = %detail, "API request rejected, service not ready");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Prediction service is not ready".to_string(),
                    None,
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code,
                message,
                invalid_symptoms,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<PredictionError> for ApiError {
    fn from(err: PredictionError) -> Self {
        match err {
            PredictionError::InvalidSymptoms(names) => ApiError::InvalidSymptoms(names),
            PredictionError::EmptySymptoms => ApiError::BadRequest(err.to_string()),
            PredictionError::NotFound(detail) => ApiError::NotFound(detail),
            PredictionError::ServiceUnavailable(reason) => ApiError::ServiceUnavailable(reason),
            PredictionError::UnknownLabel { .. }
            | PredictionError::DimensionMismatch { .. }
            | PredictionError::Inference(_)
            | PredictionError::ModelUnavailable(_)
            | PredictionError::DataLoad(_) => ApiError::Internal(err.to_string()),
        }
    }
}
