use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

pub const STATUS_SCHEDULED: &str = "SCHEDULED";
pub const STATUS_CANCELLED: &str = "CANCELLED";
pub const STATUS_COMPLETED: &str = "COMPLETED";

pub const SESSION_STATUSES: [&str; 3] = [STATUS_SCHEDULED, STATUS_CANCELLED, STATUS_COMPLETED];

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EventSession {
    pub id: String,
    pub event_id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    /// `None` means unlimited capacity.
    pub max_attendees: Option<i32>,
    pub allow_waitlist: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

pub struct NewSessionParams {
    pub event_id: String,
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: Option<String>,
    pub max_attendees: Option<i32>,
    pub allow_waitlist: bool,
}

impl EventSession {
    pub fn new(params: NewSessionParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_id: params.event_id,
            title: params.title,
            description: params.description,
            start_time: params.start,
            end_time: params.end,
            location: params.location,
            max_attendees: params.max_attendees,
            allow_waitlist: params.allow_waitlist,
            status: STATUS_SCHEDULED.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == STATUS_SCHEDULED
    }
}
