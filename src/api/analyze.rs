use axum::extract::State;
use axum::Json;

use crate::error::AnalyzeError;
use crate::models::{AnalyzeRequest, AnalyzeResponse};
use crate::state::AppState;

/// POST /api/analyze - Parse a stack trace and search for fixes:
///   1. Classify language and extract the (root cause) exception
///   2. Build onion queries for GitHub issues and Stack Overflow
///   3. Fetch both sources concurrently
///   4. Score, merge and return the top results
pub async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AnalyzeError> {
    let response = state.pipeline.analyze(&req.stack_trace).await?;
    Ok(Json(response))
}

/// GET /api/health
pub async fn health() -> &'static str {
    "ok"
}
