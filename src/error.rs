use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Errors surfaced to the caller of the analyze pipeline.
///
/// Upstream failures are absorbed by the source clients and never show up here.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AnalyzeError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Could not detect a supported language (java, python) in the stack trace")]
    UnsupportedLanguage,
}

impl AnalyzeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AnalyzeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AnalyzeError::UnsupportedLanguage => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

/// JSON body returned for rejected requests
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::warn!("Rejected analyze request ({status}): {self}");
        let body = ErrorBody {
            message: self.to_string(),
            timestamp: Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}
