use std::env;
use std::str::FromStr;

use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Buffered events per SSE subscriber before it starts lagging.
    pub broadcast_capacity: usize,
    pub notification_queue_capacity: usize,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let config = Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| AppError::Config("DATABASE_URL must be set".into()))?,
            port: parse_var("PORT", 3000)?,
            broadcast_capacity: parse_var("BROADCAST_CAPACITY", 256)?,
            notification_queue_capacity: parse_var("NOTIFICATION_QUEUE_CAPACITY", 1024)?,
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Channel capacities must be non-zero.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.broadcast_capacity == 0 {
            return Err(AppError::Config("BROADCAST_CAPACITY must be at least 1".into()));
        }
        if self.notification_queue_capacity == 0 {
            return Err(AppError::Config("NOTIFICATION_QUEUE_CAPACITY must be at least 1".into()));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a number, got '{}'", name, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_falls_back_to_default() {
        let port: u16 = parse_var("CAPACITY_TEST_UNSET_PORT", 4242).unwrap();
        assert_eq!(port, 4242);
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        // SAFETY: the variable name is unique to this test.
        unsafe { env::set_var("CAPACITY_TEST_BAD_PORT", "not-a-port") };
        let result: Result<u16, _> = parse_var("CAPACITY_TEST_BAD_PORT", 3000);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    fn config(broadcast_capacity: usize, notification_queue_capacity: usize) -> Config {
        Config {
            database_url: "sqlite::memory:".into(),
            port: 3000,
            broadcast_capacity,
            notification_queue_capacity,
            log_dir: "./logs".into(),
        }
    }

    #[test]
    fn test_zero_channel_capacities_are_rejected() {
        assert!(matches!(config(0, 16).validate(), Err(AppError::Config(_))));
        assert!(matches!(config(16, 0).validate(), Err(AppError::Config(_))));
        assert!(config(1, 1).validate().is_ok());
    }
}
