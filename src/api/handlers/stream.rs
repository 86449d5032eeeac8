use axum::{extract::State, response::IntoResponse};
use crate::state::AppState;
use crate::infra::realtime::sse_broadcaster::sse_stream;
use std::sync::Arc;
use tracing::info;

pub async fn subscribe(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rx = state.broadcaster.subscribe();
    info!("New SSE subscriber ({} connected)", state.broadcaster.subscriber_count());
    sse_stream(rx)
}
