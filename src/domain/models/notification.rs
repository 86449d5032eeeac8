use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    SessionRegistration,
    WaitlistJoined,
    WaitlistPromoted,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::SessionRegistration => "SESSION_REGISTRATION",
            NotificationType::WaitlistJoined => "WAITLIST_JOINED",
            NotificationType::WaitlistPromoted => "WAITLIST_PROMOTED",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub session_id: Option<String>,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(command: &NotificationCommand, title: String, message: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: command.user_id.clone(),
            session_id: Some(command.session_id.clone()),
            notification_type: command.notification_type.as_str().to_string(),
            title,
            message,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

/// Queued request to persist a notification once a capacity mutation has committed.
#[derive(Debug, Serialize, Clone)]
pub struct NotificationCommand {
    pub notification_type: NotificationType,
    pub user_id: String,
    pub session_id: String,
    pub session_title: String,
    pub position: Option<i32>,
}
