use serde::Serialize;
use serde_json::Value;

pub const MODULE_SESSIONS: &str = "sessions";

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BroadcastType {
    SessionRegistration,
    SessionCancelled,
    SessionUpdated,
    WaitlistJoined,
    WaitlistLeft,
    WaitlistPromoted,
}

impl BroadcastType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BroadcastType::SessionRegistration => "SESSION_REGISTRATION",
            BroadcastType::SessionCancelled => "SESSION_CANCELLED",
            BroadcastType::SessionUpdated => "SESSION_UPDATED",
            BroadcastType::WaitlistJoined => "WAITLIST_JOINED",
            BroadcastType::WaitlistLeft => "WAITLIST_LEFT",
            BroadcastType::WaitlistPromoted => "WAITLIST_PROMOTED",
        }
    }
}

/// Real-time event pushed to every subscriber as `{type, module, data}`.
#[derive(Debug, Serialize, Clone)]
pub struct BroadcastEvent {
    #[serde(rename = "type")]
    pub event_type: BroadcastType,
    pub module: String,
    pub data: Value,
}

impl BroadcastEvent {
    pub fn sessions(event_type: BroadcastType, data: Value) -> Self {
        Self {
            event_type,
            module: MODULE_SESSIONS.to_string(),
            data,
        }
    }
}
