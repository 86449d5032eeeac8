use axum::{
    body::Body,
    extract::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{capacity, health, notification, session, stream};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Capacity & Waitlist
        .route("/api/v1/sessions/capacity", get(capacity::get_capacity).post(capacity::handle_capacity_action))

        // Sessions
        .route("/api/v1/events/{event_id}/sessions", get(session::list_sessions).post(session::create_session))
        .route("/api/v1/sessions/{session_id}", get(session::get_session).put(session::update_session).delete(session::delete_session))
        .route("/api/v1/sessions/{session_id}/registrations", get(session::list_registrations))
        .route("/api/v1/sessions/{session_id}/waitlist", get(session::list_waitlist))
        .route("/api/v1/sessions/{session_id}/check-in", post(session::check_in))
        .route("/api/v1/sessions/{session_id}/attendance/{user_id}", get(session::attendance_status))

        // Notifications
        .route("/api/v1/users/{user_id}/notifications", get(notification::list_user_notifications))
        .route("/api/v1/notifications/{notification_id}/read", post(notification::mark_notification_read))

        // Real-time
        .route("/api/v1/stream", get(stream::subscribe))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        session_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
