use serde::Serialize;
use sqlx::FromRow;
use thiserror::Error;

use super::waitlist::WaitlistEntry;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityError {
    #[error("Session not found")]
    SessionNotFound,
    #[error("Session is not open for registration")]
    SessionClosed,
    #[error("Already registered for this session")]
    AlreadyRegistered,
    #[error("Already on the waitlist for this session")]
    AlreadyWaitlisted,
    #[error("Session is full")]
    SessionFull,
    #[error("Session is full. You can join the waitlist")]
    WaitlistSuggested,
    #[error("Waitlist is not enabled for this session")]
    WaitlistDisabled,
    #[error("Not registered for this session")]
    NotRegistered,
    #[error("Not on the waitlist for this session")]
    NotWaitlisted,
}

#[derive(Debug, FromRow, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapacityCounts {
    pub registered: i64,
    pub checked_in: i64,
    pub waitlisted: i64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CapacityInfo {
    pub session_id: String,
    pub title: String,
    pub max_attendees: Option<i32>,
    pub allow_waitlist: bool,
    pub registered_count: i64,
    pub checked_in_count: i64,
    pub waitlist_count: i64,
    /// `None` for sessions without a capacity limit.
    pub available_spots: Option<i64>,
    pub utilization_rate: f64,
    pub is_full: bool,
    pub is_overbooked: bool,
}

#[derive(Debug, Serialize, Clone)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    None,
    Registered { status: String },
    Waitlisted { position: i32 },
}

impl From<&WaitlistEntry> for AttendanceStatus {
    fn from(entry: &WaitlistEntry) -> Self {
        AttendanceStatus::Waitlisted { position: entry.position }
    }
}
