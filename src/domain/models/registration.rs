use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

pub const STATUS_CONFIRMED: &str = "CONFIRMED";
pub const STATUS_CHECKED_IN: &str = "CHECKED_IN";

/// A confirmed slot in a session. Checked-in registrations keep occupying capacity.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: String,
    pub session_id: String,
    pub user_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub checked_in_at: Option<DateTime<Utc>>,
}

impl Registration {
    pub fn new(session_id: String, user_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id,
            user_id,
            status: STATUS_CONFIRMED.to_string(),
            created_at: Utc::now(),
            checked_in_at: None,
        }
    }
}
