pub mod sqlite_session_repo;
pub mod sqlite_capacity_repo;
pub mod sqlite_notification_repo;

pub mod postgres_session_repo;
pub mod postgres_capacity_repo;
pub mod postgres_notification_repo;
