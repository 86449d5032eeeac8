use crate::domain::models::{
    broadcast::BroadcastEvent,
    capacity::CapacityCounts,
    notification::{Notification, NotificationCommand},
    registration::Registration,
    session::EventSession,
    waitlist::{Promotion, WaitlistEntry},
};
use crate::error::AppError;
use async_trait::async_trait;
use tokio::sync::broadcast;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &EventSession) -> Result<EventSession, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<EventSession>, AppError>;
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<EventSession>, AppError>;
    /// `None` when the session is gone or already holds more registrations
    /// than the new `max_attendees`. The count is checked inside the write.
    async fn update(&self, session: &EventSession) -> Result<Option<EventSession>, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

/// Registration ledger and waitlist queue. Every write re-validates capacity
/// and waitlist state inside the statement or transaction that mutates it.
#[async_trait]
pub trait CapacityRepository: Send + Sync {
    async fn counts(&self, session_id: &str) -> Result<CapacityCounts, AppError>;
    async fn find_registration(&self, session_id: &str, user_id: &str) -> Result<Option<Registration>, AppError>;
    async fn find_waitlist_entry(&self, session_id: &str, user_id: &str) -> Result<Option<WaitlistEntry>, AppError>;
    async fn list_registrations(&self, session_id: &str) -> Result<Vec<Registration>, AppError>;
    /// Ordered by position.
    async fn list_waitlist(&self, session_id: &str) -> Result<Vec<WaitlistEntry>, AppError>;

    /// Inserts only while a spot is free and the user is not waitlisted. `None` means nothing was inserted.
    async fn insert_registration(&self, registration: &Registration) -> Result<Option<Registration>, AppError>;
    async fn delete_registration(&self, session_id: &str, user_id: &str) -> Result<Option<Registration>, AppError>;
    async fn check_in(&self, session_id: &str, user_id: &str) -> Result<Option<Registration>, AppError>;

    /// Appends at `count + 1` when the session allows waitlisting and the user holds no registration.
    async fn insert_waitlist_entry(&self, entry: &WaitlistEntry) -> Result<Option<WaitlistEntry>, AppError>;
    /// Removes the entry and closes the gap it leaves.
    async fn delete_waitlist_entry(&self, session_id: &str, user_id: &str) -> Result<Option<WaitlistEntry>, AppError>;

    /// Moves the waitlist head into the ledger in one transaction when a spot is free.
    async fn promote_next(&self, session_id: &str) -> Result<Option<Promotion>, AppError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &Notification) -> Result<Notification, AppError>;
    async fn list_by_user(&self, user_id: &str, unread_only: bool) -> Result<Vec<Notification>, AppError>;
    async fn mark_read(&self, id: &str) -> Result<Option<Notification>, AppError>;
}

/// Fire-and-forget hand-off of notifications to the background worker.
pub trait NotificationSink: Send + Sync {
    fn enqueue(&self, command: NotificationCommand) -> Result<(), AppError>;
}

pub trait Broadcaster: Send + Sync {
    /// Lossy: having no subscribers is not an error.
    fn publish(&self, event: BroadcastEvent);
    fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent>;
    fn subscriber_count(&self) -> usize;
}
