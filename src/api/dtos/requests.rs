use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::str::FromStr;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityAction {
    Register,
    JoinWaitlist,
    CancelRegistration,
    LeaveWaitlist,
    ProcessWaitlist,
}

impl FromStr for CapacityAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "register" => Ok(CapacityAction::Register),
            "join_waitlist" => Ok(CapacityAction::JoinWaitlist),
            "cancel_registration" => Ok(CapacityAction::CancelRegistration),
            "leave_waitlist" => Ok(CapacityAction::LeaveWaitlist),
            "process_waitlist" => Ok(CapacityAction::ProcessWaitlist),
            other => Err(AppError::Validation(format!("Invalid action: {}", other))),
        }
    }
}

/// Body of `POST /sessions/capacity`. Fields are optional so missing ones surface as validation errors.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityActionRequest {
    pub action: Option<String>,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityQuery {
    pub session_id: Option<String>,
    pub event_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    pub max_attendees: Option<i32>,
    pub allow_waitlist: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub max_attendees: Option<i32>,
    pub remove_capacity_limit: Option<bool>,
    pub allow_waitlist: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub user_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsQuery {
    pub unread_only: Option<bool>,
}

/// Rejects absent or blank identifiers.
pub fn require(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("{} is required", field))),
    }
}
