use axum::{extract::{Query, State}, response::{IntoResponse, Response}, Json};
use crate::state::AppState;
use crate::api::dtos::requests::{require, CapacityAction, CapacityActionRequest, CapacityQuery};
use crate::api::dtos::responses::{ActionResponse, EventCapacityResponse};
use crate::domain::models::capacity::CapacityInfo;
use crate::error::AppError;
use std::sync::Arc;
use tracing::{info, warn, Span};

pub async fn get_capacity(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CapacityQuery>,
) -> Result<Response, AppError> {
    if let Some(session_id) = params.session_id.filter(|s| !s.is_empty()) {
        Span::current().record("session_id", session_id.as_str());
        let info = state.capacity_service.session_capacity(&session_id).await?;
        return Ok(Json(info).into_response());
    }

    if let Some(event_id) = params.event_id.filter(|s| !s.is_empty()) {
        let sessions = state.capacity_service.event_capacity(&event_id).await?;
        return Ok(Json(EventCapacityResponse { event_id, sessions }).into_response());
    }

    Err(AppError::Validation("sessionId or eventId is required".into()))
}

pub async fn handle_capacity_action(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CapacityActionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let action: CapacityAction = require(payload.action, "action")?.parse()?;
    let session_id = require(payload.session_id, "sessionId")?;
    Span::current().record("session_id", session_id.as_str());
    let user_id = payload.user_id;

    let mut response = match action {
        CapacityAction::Register => {
            let user_id = require_user(user_id)?;
            let receipt = state.capacity_service.register(&session_id, &user_id).await?;
            let mut response = ActionResponse::ok("Successfully registered for session");
            response.registration = Some(receipt.registration);
            response
        }
        CapacityAction::JoinWaitlist => {
            let user_id = require_user(user_id)?;
            let entry = state.capacity_service.join_waitlist(&session_id, &user_id).await?;
            let mut response = ActionResponse::ok(format!("Added to waitlist at position {}", entry.position));
            response.position = Some(entry.position);
            response.waitlist_entry = Some(entry);
            response
        }
        CapacityAction::CancelRegistration => {
            let user_id = require_user(user_id)?;
            let receipt = state.capacity_service.cancel_registration(&session_id, &user_id).await?;
            let mut response = ActionResponse::ok("Registration cancelled");
            response.registration = Some(receipt.registration);
            response.promoted_user_ids = receipt.promotion.into_iter().map(|p| p.registration.user_id).collect();
            response
        }
        CapacityAction::LeaveWaitlist => {
            let user_id = require_user(user_id)?;
            let entry = state.capacity_service.leave_waitlist(&session_id, &user_id).await?;
            let mut response = ActionResponse::ok("Removed from waitlist");
            response.waitlist_entry = Some(entry);
            response
        }
        CapacityAction::ProcessWaitlist => {
            let promotions = state.capacity_service.drain(&session_id).await?;
            info!("process_waitlist on session {} promoted {} users", session_id, promotions.len());
            let mut response = ActionResponse::ok(format!("Processed waitlist, {} promoted", promotions.len()));
            response.promoted_user_ids = promotions.into_iter().map(|p| p.registration.user_id).collect();
            response
        }
    };

    response.capacity = capacity_snapshot(&state, &session_id).await;
    Ok(Json(response))
}

fn require_user(user_id: Option<String>) -> Result<String, AppError> {
    let user_id = require(user_id, "userId")?;
    Span::current().record("user_id", user_id.as_str());
    Ok(user_id)
}

/// Capacity after a committed action. A failed read must not turn that action into an error.
pub(crate) async fn capacity_snapshot(state: &AppState, session_id: &str) -> Option<CapacityInfo> {
    match state.capacity_service.session_capacity(session_id).await {
        Ok(info) => Some(info),
        Err(e) => {
            warn!("Could not load capacity for session {}: {}", session_id, e);
            None
        }
    }
}
