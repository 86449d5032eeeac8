use crate::domain::{models::session::EventSession, ports::SessionRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresSessionRepo {
    pool: PgPool,
}

impl PostgresSessionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepo {
    async fn create(&self, session: &EventSession) -> Result<EventSession, AppError> {
        sqlx::query_as::<_, EventSession>(
            r#"INSERT INTO event_sessions (id, event_id, title, description, start_time, end_time, location, max_attendees, allow_waitlist, status, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
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
            "SELECT * FROM event_sessions WHERE id = $1"
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_event(&self, event_id: &str) -> Result<Vec<EventSession>, AppError> {
        sqlx::query_as::<_, EventSession>(
            "SELECT * FROM event_sessions WHERE event_id = $1 ORDER BY start_time ASC"
        )
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, session: &EventSession) -> Result<Option<EventSession>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Same row lock the ledger writes take, so no registration lands between count and update.
        sqlx::query("SELECT id FROM event_sessions WHERE id = $1 FOR UPDATE")
            .bind(&session.id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let updated = sqlx::query_as::<_, EventSession>(
            r#"UPDATE event_sessions SET title=$1, description=$2, location=$3, max_attendees=$4, allow_waitlist=$5, status=$6
               WHERE id=$7
                 AND ($4::INTEGER IS NULL
                      OR (SELECT COUNT(*) FROM session_registrations r WHERE r.session_id = event_sessions.id) <= $4)
               RETURNING *"#
        )
            .bind(&session.title)
            .bind(&session.description)
            .bind(&session.location)
            .bind(session.max_attendees)
            .bind(session.allow_waitlist)
            .bind(&session.status)
            .bind(&session.id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM event_sessions WHERE id = $1")
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
