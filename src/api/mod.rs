pub mod analyze;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// All HTTP routes. There is no CORS layer; callers sit behind the same origin.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze::analyze))
        .route("/api/health", get(analyze::health))
        .with_state(state)
}
