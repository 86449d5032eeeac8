pub mod factory;
pub mod notifications;
pub mod realtime;
pub mod repositories;
