use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::domain::models::{
    broadcast::{BroadcastEvent, BroadcastType},
    capacity::{AttendanceStatus, CapacityError, CapacityInfo},
    notification::{NotificationCommand, NotificationType},
    registration::Registration,
    session::EventSession,
    waitlist::{Promotion, WaitlistEntry},
};
use crate::domain::ports::{Broadcaster, CapacityRepository, NotificationSink, SessionRepository};
use crate::domain::services::capacity::{available_spots, capacity_info};
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct RegistrationReceipt {
    pub registration: Registration,
    pub available_spots: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct SessionUpdateReceipt {
    pub session: EventSession,
    pub promotions: Vec<Promotion>,
}

#[derive(Debug, Clone)]
pub struct CancellationReceipt {
    pub registration: Registration,
    pub promotion: Option<Promotion>,
    pub available_spots: Option<i64>,
}

/// Registration ledger, waitlist queue and promotion engine over the capacity store.
///
/// Notifications and broadcasts are emitted only after the underlying write has
/// committed, and a failure to emit never undoes that write.
pub struct CapacityService {
    session_repo: Arc<dyn SessionRepository>,
    capacity_repo: Arc<dyn CapacityRepository>,
    notifier: Arc<dyn NotificationSink>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl CapacityService {
    pub fn new(
        session_repo: Arc<dyn SessionRepository>,
        capacity_repo: Arc<dyn CapacityRepository>,
        notifier: Arc<dyn NotificationSink>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self { session_repo, capacity_repo, notifier, broadcaster }
    }

    async fn load_session(&self, session_id: &str) -> Result<EventSession, AppError> {
        self.session_repo.find_by_id(session_id).await?
            .ok_or_else(|| CapacityError::SessionNotFound.into())
    }

    pub async fn session_capacity(&self, session_id: &str) -> Result<CapacityInfo, AppError> {
        let session = self.load_session(session_id).await?;
        let counts = self.capacity_repo.counts(&session.id).await?;
        Ok(capacity_info(&session, counts))
    }

    pub async fn event_capacity(&self, event_id: &str) -> Result<Vec<CapacityInfo>, AppError> {
        let sessions = self.session_repo.list_by_event(event_id).await?;
        let mut infos = Vec::with_capacity(sessions.len());
        for session in &sessions {
            let counts = self.capacity_repo.counts(&session.id).await?;
            infos.push(capacity_info(session, counts));
        }
        Ok(infos)
    }

    pub async fn attendance_status(&self, session_id: &str, user_id: &str) -> Result<AttendanceStatus, AppError> {
        let session = self.load_session(session_id).await?;
        if let Some(registration) = self.capacity_repo.find_registration(&session.id, user_id).await? {
            return Ok(AttendanceStatus::Registered { status: registration.status });
        }
        if let Some(entry) = self.capacity_repo.find_waitlist_entry(&session.id, user_id).await? {
            return Ok(AttendanceStatus::from(&entry));
        }
        Ok(AttendanceStatus::None)
    }

    pub async fn register(&self, session_id: &str, user_id: &str) -> Result<RegistrationReceipt, AppError> {
        let session = self.load_session(session_id).await?;
        if !session.is_open() {
            return Err(CapacityError::SessionClosed.into());
        }
        if self.capacity_repo.find_registration(&session.id, user_id).await?.is_some() {
            return Err(CapacityError::AlreadyRegistered.into());
        }
        if self.capacity_repo.find_waitlist_entry(&session.id, user_id).await?.is_some() {
            return Err(CapacityError::AlreadyWaitlisted.into());
        }

        let counts = self.capacity_repo.counts(&session.id).await?;
        if available_spots(session.max_attendees, counts.registered) == Some(0) {
            return Err(full_error(&session).into());
        }

        let candidate = Registration::new(session.id.clone(), user_id.to_string());
        let Some(registration) = self.capacity_repo.insert_registration(&candidate).await? else {
            // Lost the last spot to a concurrent request, or joined the waitlist meanwhile.
            if self.capacity_repo.find_waitlist_entry(&session.id, user_id).await?.is_some() {
                return Err(CapacityError::AlreadyWaitlisted.into());
            }
            return Err(full_error(&session).into());
        };

        let spots = self.current_available_spots(&session, Some(counts.registered + 1)).await;
        info!("User {} registered for session {} ({:?} spots left)", user_id, session.id, spots);

        self.notify(NotificationType::SessionRegistration, &session, user_id, None);
        self.broadcaster.publish(BroadcastEvent::sessions(
            BroadcastType::SessionRegistration,
            json!({ "sessionId": session.id, "userId": user_id, "availableSpots": spots }),
        ));

        Ok(RegistrationReceipt { registration, available_spots: spots })
    }

    pub async fn cancel_registration(&self, session_id: &str, user_id: &str) -> Result<CancellationReceipt, AppError> {
        let session = self.load_session(session_id).await?;
        let registration = self.capacity_repo.delete_registration(&session.id, user_id).await?
            .ok_or(CapacityError::NotRegistered)?;
        info!("User {} cancelled registration for session {}", user_id, session.id);

        // One slot was freed, so at most one promotion is due.
        let promotion = match self.promote_session(&session).await {
            Ok(promotion) => promotion,
            Err(e) => {
                warn!("Promotion after cancellation in session {} failed: {}", session.id, e);
                None
            }
        };

        let spots = self.current_available_spots(&session, None).await;
        self.broadcaster.publish(BroadcastEvent::sessions(
            BroadcastType::SessionCancelled,
            json!({
                "sessionId": session.id,
                "userId": user_id,
                "availableSpots": spots,
                "promotedUserId": promotion.as_ref().map(|p| p.registration.user_id.clone()),
            }),
        ));

        Ok(CancellationReceipt { registration, promotion, available_spots: spots })
    }

    pub async fn check_in(&self, session_id: &str, user_id: &str) -> Result<Registration, AppError> {
        let session = self.load_session(session_id).await?;
        let registration = self.capacity_repo.check_in(&session.id, user_id).await?
            .ok_or(CapacityError::NotRegistered)?;
        info!("User {} checked in to session {}", user_id, session.id);
        Ok(registration)
    }

    pub async fn join_waitlist(&self, session_id: &str, user_id: &str) -> Result<WaitlistEntry, AppError> {
        let session = self.load_session(session_id).await?;
        if !session.is_open() {
            return Err(CapacityError::SessionClosed.into());
        }
        if !session.allow_waitlist {
            return Err(CapacityError::WaitlistDisabled.into());
        }
        if self.capacity_repo.find_waitlist_entry(&session.id, user_id).await?.is_some() {
            return Err(CapacityError::AlreadyWaitlisted.into());
        }
        if self.capacity_repo.find_registration(&session.id, user_id).await?.is_some() {
            return Err(CapacityError::AlreadyRegistered.into());
        }

        let candidate = WaitlistEntry::new(session.id.clone(), user_id.to_string());
        let Some(entry) = self.capacity_repo.insert_waitlist_entry(&candidate).await? else {
            if self.capacity_repo.find_registration(&session.id, user_id).await?.is_some() {
                return Err(CapacityError::AlreadyRegistered.into());
            }
            return Err(CapacityError::WaitlistDisabled.into());
        };
        info!("User {} joined waitlist for session {} at position {}", user_id, session.id, entry.position);

        self.notify(NotificationType::WaitlistJoined, &session, user_id, Some(entry.position));
        self.broadcaster.publish(BroadcastEvent::sessions(
            BroadcastType::WaitlistJoined,
            json!({ "sessionId": session.id, "userId": user_id, "position": entry.position }),
        ));

        Ok(entry)
    }

    pub async fn leave_waitlist(&self, session_id: &str, user_id: &str) -> Result<WaitlistEntry, AppError> {
        let session = self.load_session(session_id).await?;
        let entry = self.capacity_repo.delete_waitlist_entry(&session.id, user_id).await?
            .ok_or(CapacityError::NotWaitlisted)?;
        info!("User {} left waitlist for session {} (was position {})", user_id, session.id, entry.position);

        self.broadcaster.publish(BroadcastEvent::sessions(
            BroadcastType::WaitlistLeft,
            json!({ "sessionId": session.id, "userId": user_id, "position": entry.position }),
        ));

        Ok(entry)
    }

    /// Promotes at most one waitlisted user. A no-op when no spot is free or nobody waits.
    pub async fn promote(&self, session_id: &str) -> Result<Option<Promotion>, AppError> {
        let session = self.load_session(session_id).await?;
        self.promote_session(&session).await
    }

    /// Promotes until the session is full or the waitlist is empty.
    pub async fn drain(&self, session_id: &str) -> Result<Vec<Promotion>, AppError> {
        let session = self.load_session(session_id).await?;
        let mut promotions = Vec::new();
        while let Some(promotion) = self.promote_session(&session).await? {
            promotions.push(promotion);
        }
        if !promotions.is_empty() {
            info!("Drained {} waitlist entries into session {}", promotions.len(), session.id);
        }
        Ok(promotions)
    }

    /// Persists an edited session. A capacity below the current registration
    /// count is refused by the write itself. Growth, a lifted limit or
    /// reopening the session drains the waitlist.
    pub async fn update_session(&self, previous: &EventSession, edited: EventSession) -> Result<SessionUpdateReceipt, AppError> {
        let Some(updated) = self.session_repo.update(&edited).await? else {
            if self.session_repo.find_by_id(&edited.id).await?.is_none() {
                return Err(CapacityError::SessionNotFound.into());
            }
            let registered = self.capacity_repo.counts(&edited.id).await?.registered;
            return Err(AppError::Conflict(format!(
                "Cannot reduce capacity to {}. {} attendees already registered.",
                edited.max_attendees.unwrap_or_default(), registered
            )));
        };
        info!("Updated session {}", updated.id);

        let grew = match (previous.max_attendees, updated.max_attendees) {
            (Some(_), None) => true,
            (Some(before), Some(after)) => after > before,
            _ => false,
        };
        let reopened = !previous.is_open() && updated.is_open();

        let mut promotions = Vec::new();
        if grew || reopened {
            loop {
                match self.promote_session(&updated).await {
                    Ok(Some(promotion)) => promotions.push(promotion),
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Waitlist drain after updating session {} stopped: {}", updated.id, e);
                        break;
                    }
                }
            }
        }

        self.broadcaster.publish(BroadcastEvent::sessions(
            BroadcastType::SessionUpdated,
            json!({ "sessionId": updated.id, "maxAttendees": updated.max_attendees, "status": updated.status }),
        ));

        Ok(SessionUpdateReceipt { session: updated, promotions })
    }

    async fn promote_session(&self, session: &EventSession) -> Result<Option<Promotion>, AppError> {
        if !session.is_open() {
            return Ok(None);
        }

        let counts = self.capacity_repo.counts(&session.id).await?;
        if counts.waitlisted == 0 || available_spots(session.max_attendees, counts.registered) == Some(0) {
            return Ok(None);
        }

        let Some(promotion) = self.capacity_repo.promote_next(&session.id).await? else {
            return Ok(None);
        };
        let user_id = promotion.registration.user_id.clone();
        info!(
            "Promoted user {} from waitlist position {} into session {}",
            user_id, promotion.previous_position, session.id
        );

        self.notify(NotificationType::WaitlistPromoted, session, &user_id, None);
        self.broadcaster.publish(BroadcastEvent::sessions(
            BroadcastType::WaitlistPromoted,
            json!({ "sessionId": session.id, "userId": user_id }),
        ));

        Ok(Some(promotion))
    }

    async fn current_available_spots(&self, session: &EventSession, estimated_registered: Option<i64>) -> Option<i64> {
        match self.capacity_repo.counts(&session.id).await {
            Ok(counts) => available_spots(session.max_attendees, counts.registered),
            Err(e) => {
                warn!("Could not refresh capacity for session {}: {}", session.id, e);
                estimated_registered.and_then(|registered| available_spots(session.max_attendees, registered))
            }
        }
    }

    fn notify(&self, kind: NotificationType, session: &EventSession, user_id: &str, position: Option<i32>) {
        let command = NotificationCommand {
            notification_type: kind,
            user_id: user_id.to_string(),
            session_id: session.id.clone(),
            session_title: session.title.clone(),
            position,
        };
        if let Err(e) = self.notifier.enqueue(command) {
            warn!("Failed to queue {} notification for user {}: {}", kind.as_str(), user_id, e);
        }
    }
}

fn full_error(session: &EventSession) -> CapacityError {
    if session.allow_waitlist {
        CapacityError::WaitlistSuggested
    } else {
        CapacityError::SessionFull
    }
}
