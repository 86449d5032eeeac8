use crate::domain::{models::session::EventSession, ports::SessionRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteSessionRepo {
    pool: SqlitePool,
}

impl SqliteSessionRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepo {
    async fn create(&self, session: &EventSession) -> Result<EventSession, AppError> {
        sqlx::query_as::<_, EventSession>(
            r#"INSERT INTO event_sessions (id, event_id, title, description, start_time, end_time, location, max_attendees, allow_waitlist, status, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               RETURNING *"#
        )
            .bind(&session.id)
            .bind(&session.event_id)
            .bind(&session.title)
            .bind(&session.description)
            .bind(session.start_time)
            .bind(session.end_time)
            .bind(&session.location)
            .bind(session.max_attendees)
            .bind(session.allow_waitlist)
            .bind(&session.status)
            .bind(session.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<EventSession>, AppError> {
        sqlx::query_as::<_, EventSession>(
            "SELECT * FROM event_sessions WHERE id = ?"
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_event(&self, event_id: &str) -> Result<Vec<EventSession>, AppError> {
        sqlx::query_as::<_, EventSession>(
            "SELECT * FROM event_sessions WHERE event_id = ? ORDER BY start_time ASC"
        )
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, session: &EventSession) -> Result<Option<EventSession>, AppError> {
        sqlx::query_as::<_, EventSession>(
            r#"UPDATE event_sessions SET title=?, description=?, location=?, max_attendees=?, allow_waitlist=?, status=?
               WHERE id=?
                 AND (? IS NULL
                      OR (SELECT COUNT(*) FROM session_registrations r WHERE r.session_id = event_sessions.id) <= ?)
               RETURNING *"#
        )
            .bind(&session.title)
            .bind(&session.description)
            .bind(&session.location)
            .bind(session.max_attendees)
            .bind(session.allow_waitlist)
            .bind(&session.status)
            .bind(&session.id)
            .bind(session.max_attendees)
            .bind(session.max_attendees)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM event_sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Session not found".into()));
        }
        Ok(())
    }
}
