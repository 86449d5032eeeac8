use std::sync::Arc;
use crate::domain::ports::{Broadcaster, CapacityRepository, NotificationRepository, SessionRepository};
use crate::domain::services::capacity_service::CapacityService;
use crate::domain::services::notification_templates::NotificationTemplates;

#[derive(Clone)]
pub struct AppState {
    pub session_repo: Arc<dyn SessionRepository>,
    pub capacity_repo: Arc<dyn CapacityRepository>,
    pub notification_repo: Arc<dyn NotificationRepository>,
    pub capacity_service: Arc<CapacityService>,
    pub broadcaster: Arc<dyn Broadcaster>,
    pub templates: Arc<NotificationTemplates>,
}
