use serde::Serialize;

use crate::domain::models::{
    capacity::CapacityInfo,
    registration::Registration,
    waitlist::WaitlistEntry,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<Registration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waitlist_entry: Option<WaitlistEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<CapacityInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub promoted_user_ids: Vec<String>,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            registration: None,
            waitlist_entry: None,
            position: None,
            capacity: None,
            promoted_user_ids: Vec::new(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCapacityResponse {
    pub event_id: String,
    pub sessions: Vec<CapacityInfo>,
}
