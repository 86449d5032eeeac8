use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use std::sync::Arc;
use serde_json::json;
use tracing::error;

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // Cheap read to check the pool.
    match state.session_repo.list_by_event("__health__").await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            error!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "unavailable" })))
        }
    }
}
