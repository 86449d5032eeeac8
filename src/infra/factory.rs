use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tokio::sync::mpsc;
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::state::AppState;
use crate::domain::models::notification::NotificationCommand;
use crate::domain::ports::{CapacityRepository, NotificationRepository, SessionRepository};
use crate::domain::services::capacity_service::CapacityService;
use crate::domain::services::notification_templates::NotificationTemplates;
use crate::error::AppError;
use crate::infra::notifications::queue::NotificationQueue;
use crate::infra::realtime::sse_broadcaster::SseBroadcaster;
use crate::infra::repositories::{
    postgres_capacity_repo::PostgresCapacityRepo, postgres_notification_repo::PostgresNotificationRepo,
    postgres_session_repo::PostgresSessionRepo,
    sqlite_capacity_repo::SqliteCapacityRepo, sqlite_notification_repo::SqliteNotificationRepo,
    sqlite_session_repo::SqliteSessionRepo,
};

pub struct Repositories {
    pub session_repo: Arc<dyn SessionRepository>,
    pub capacity_repo: Arc<dyn CapacityRepository>,
    pub notification_repo: Arc<dyn NotificationRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            session_repo: Arc::new(PostgresSessionRepo::new(pool.clone())),
            capacity_repo: Arc::new(PostgresCapacityRepo::new(pool.clone())),
            notification_repo: Arc::new(PostgresNotificationRepo::new(pool)),
        }
    }

    pub fn sqlite(pool: SqlitePool) -> Self {
        Self {
            session_repo: Arc::new(SqliteSessionRepo::new(pool.clone())),
            capacity_repo: Arc::new(SqliteCapacityRepo::new(pool.clone())),
            notification_repo: Arc::new(SqliteNotificationRepo::new(pool)),
        }
    }
}

/// Wires repositories into an `AppState`. The returned receiver feeds the notification worker.
pub fn assemble_state(config: &Config, repos: Repositories) -> Result<(AppState, mpsc::Receiver<NotificationCommand>), AppError> {
    config.validate()?;

    let broadcaster = Arc::new(SseBroadcaster::new(config.broadcast_capacity));
    let (queue, notification_rx) = NotificationQueue::new(config.notification_queue_capacity);

    let capacity_service = Arc::new(CapacityService::new(
        repos.session_repo.clone(),
        repos.capacity_repo.clone(),
        Arc::new(queue),
        broadcaster.clone(),
    ));

    let state = AppState {
        session_repo: repos.session_repo,
        capacity_repo: repos.capacity_repo,
        notification_repo: repos.notification_repo,
        capacity_service,
        broadcaster,
        templates: Arc::new(NotificationTemplates::new()?),
    };

    Ok((state, notification_rx))
}

pub async fn bootstrap_state(config: &Config) -> Result<(AppState, mpsc::Receiver<NotificationCommand>), AppError> {
    let database_url = &config.database_url;

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse()
            .map_err(|e| AppError::Config(format!("Invalid Postgres URL: {}", e)))?;
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await?;

        run_postgres_migrations(&pool).await?;
        Repositories::postgres(pool)
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::Config(format!("Invalid SQLite connection string: {}", e)))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        run_sqlite_migrations(&pool).await?;
        Repositories::sqlite(pool)
    };

    assemble_state(config, repos)
}

async fn run_postgres_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations/postgres").run(pool).await?;
    info!("Postgres migrations applied");
    Ok(())
}

async fn run_sqlite_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations/sqlite").run(pool).await?;
    info!("SQLite migrations applied");
    Ok(())
}
