pub mod capacity;
pub mod health;
pub mod notification;
pub mod session;
pub mod stream;
