use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::registration::Registration;

pub const STATUS_WAITING: &str = "WAITING";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    pub id: String,
    pub session_id: String,
    pub user_id: String,
    /// 1-based, contiguous within a session.
    pub position: i32,
    pub status: String,
    pub joined_at: DateTime<Utc>,
}

impl WaitlistEntry {
    /// The position is a placeholder; the repository assigns the tail position inside the insert.
    pub fn new(session_id: String, user_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id,
            user_id,
            position: 0,
            status: STATUS_WAITING.to_string(),
            joined_at: Utc::now(),
        }
    }
}

/// Result of moving the head of a waitlist into the ledger.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub registration: Registration,
    pub previous_position: i32,
}
