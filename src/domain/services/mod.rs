pub mod capacity;
pub mod capacity_service;
pub mod notification_templates;
