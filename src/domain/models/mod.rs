pub mod broadcast;
pub mod capacity;
pub mod notification;
pub mod registration;
pub mod session;
pub mod waitlist;
