//! API Error Responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use inference_engine::InferenceError;
use serde::Serialize;
use thiserror::Error;

/// Errors returned by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid property input")]
    Validation(Vec<String>),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("Metrics recorder not installed")]
    MetricsUnavailable,
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: Vec<String>,
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Inference(InferenceError::Encoding(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::MetricsUnavailable => StatusCode::NOT_FOUND,
        }
    }

    /// Short label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::Inference(InferenceError::Encoding(_)) => "encoding",
            ApiError::Inference(_) => "inference",
            ApiError::MetricsUnavailable => "metrics",
        }
    }

    /// Messages suitable for display to the user
    pub fn messages(&self) -> Vec<String> {
        match self {
            ApiError::Validation(messages) => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            details: self.messages(),
        };
        (self.status(), Json(body)).into_response()
    }
}
