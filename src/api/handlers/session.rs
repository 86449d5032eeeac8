use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::{require, CheckInRequest, CreateSessionRequest, UpdateSessionRequest};
use crate::api::handlers::capacity::capacity_snapshot;
use crate::domain::models::session::{EventSession, NewSessionParams, SESSION_STATUSES};
use crate::error::AppError;
use std::sync::Arc;
use serde_json::json;
use tracing::{info, Span};

fn validate_capacity(max_attendees: Option<i32>) -> Result<(), AppError> {
    match max_attendees {
        Some(cap) if cap < 1 => Err(AppError::Validation("maxAttendees must be at least 1".into())),
        _ => Ok(()),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn load_session(state: &AppState, session_id: &str) -> Result<EventSession, AppError> {
    state.session_repo.find_by_id(session_id).await?
        .ok_or(AppError::NotFound("Session not found".into()))
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".into()));
    }
    if payload.end_time <= payload.start_time {
        return Err(AppError::Validation("End time must be after start time".into()));
    }
    validate_capacity(payload.max_attendees)?;

    let session = EventSession::new(NewSessionParams {
        event_id: event_id.clone(),
        title: payload.title.trim().to_string(),
        description: non_empty(payload.description),
        start: payload.start_time,
        end: payload.end_time,
        location: non_empty(payload.location),
        max_attendees: payload.max_attendees,
        allow_waitlist: payload.allow_waitlist.unwrap_or(true),
    });
    let created = state.session_repo.create(&session).await?;

    info!("Created session {} for event {}", created.id, event_id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let sessions = state.session_repo.list_by_event(&event_id).await?;
    Ok(Json(sessions))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(load_session(&state, &session_id).await?))
}

pub async fn update_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<UpdateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    Span::current().record("session_id", session_id.as_str());
    let previous = load_session(&state, &session_id).await?;
    let mut session = previous.clone();

    if let Some(title) = payload.title {
        if title.trim().is_empty() {
            return Err(AppError::Validation("Title cannot be empty".into()));
        }
        session.title = title.trim().to_string();
    }

    if let Some(desc) = payload.description {
        session.description = if desc.is_empty() { None } else { Some(desc) };
    }

    if let Some(loc) = payload.location {
        session.location = if loc.is_empty() { None } else { Some(loc) };
    }

    if let Some(status) = payload.status {
        if !SESSION_STATUSES.contains(&status.as_str()) {
            return Err(AppError::Validation(format!("Invalid status: {}", status)));
        }
        session.status = status;
    }

    if let Some(allow) = payload.allow_waitlist {
        session.allow_waitlist = allow;
    }

    if payload.remove_capacity_limit == Some(true) {
        session.max_attendees = None;
    } else if let Some(cap) = payload.max_attendees {
        validate_capacity(Some(cap))?;
        session.max_attendees = Some(cap);
    }

    let receipt = state.capacity_service.update_session(&previous, session).await?;

    Ok(Json(json!({
        "session": receipt.session,
        "promotedUserIds": receipt.promotions.into_iter().map(|p| p.registration.user_id).collect::<Vec<_>>(),
        "capacity": capacity_snapshot(&state, &session_id).await,
    })))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = load_session(&state, &session_id).await?;

    let counts = state.capacity_repo.counts(&session.id).await?;
    if counts.registered > 0 {
        return Err(AppError::Conflict("Cannot delete session with existing registrations".into()));
    }

    state.session_repo.delete(&session_id).await?;
    info!("Deleted session {} ({} waitlist entries dropped)", session_id, counts.waitlisted);
    Ok(Json(json!({"status": "deleted"})))
}

pub async fn list_registrations(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = load_session(&state, &session_id).await?;
    let registrations = state.capacity_repo.list_registrations(&session.id).await?;
    Ok(Json(registrations))
}

pub async fn list_waitlist(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = load_session(&state, &session_id).await?;
    let waitlist = state.capacity_repo.list_waitlist(&session.id).await?;
    Ok(Json(waitlist))
}

pub async fn check_in(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<CheckInRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = require(payload.user_id, "userId")?;
    Span::current().record("session_id", session_id.as_str());
    Span::current().record("user_id", user_id.as_str());

    let registration = state.capacity_service.check_in(&session_id, &user_id).await?;
    Ok(Json(registration))
}

pub async fn attendance_status(
    State(state): State<Arc<AppState>>,
    Path((session_id, user_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let status = state.capacity_service.attendance_status(&session_id, &user_id).await?;
    Ok(Json(status))
}
