use crate::domain::{
    models::{
        capacity::CapacityCounts,
        registration::Registration,
        waitlist::{Promotion, WaitlistEntry},
    },
    ports::CapacityRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

/// Every mutating transaction locks the session row first, so writes to one
/// session's ledger and waitlist are serialised.
pub struct PostgresCapacityRepo {
    pool: PgPool,
}

impl PostgresCapacityRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock_session(tx: &mut Transaction<'_, Postgres>, session_id: &str) -> Result<(), AppError> {
        sqlx::query("SELECT id FROM event_sessions WHERE id = $1 FOR UPDATE")
            .bind(session_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}

#[async_trait]
impl CapacityRepository for PostgresCapacityRepo {
    async fn counts(&self, session_id: &str) -> Result<CapacityCounts, AppError> {
        sqlx::query_as::<_, CapacityCounts>(
            r#"SELECT
                 (SELECT COUNT(*) FROM session_registrations WHERE session_id = $1) AS registered,
                 (SELECT COUNT(*) FROM session_registrations WHERE session_id = $1 AND status = 'CHECKED_IN') AS checked_in,
                 (SELECT COUNT(*) FROM session_waitlist WHERE session_id = $1) AS waitlisted"#
        )
            .bind(session_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_registration(&self, session_id: &str, user_id: &str) -> Result<Option<Registration>, AppError> {
        sqlx::query_as::<_, Registration>("SELECT * FROM session_registrations WHERE session_id = $1 AND user_id = $2")
            .bind(session_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_waitlist_entry(&self, session_id: &str, user_id: &str) -> Result<Option<WaitlistEntry>, AppError> {
        sqlx::query_as::<_, WaitlistEntry>("SELECT * FROM session_waitlist WHERE session_id = $1 AND user_id = $2")
            .bind(session_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_registrations(&self, session_id: &str) -> Result<Vec<Registration>, AppError> {
        sqlx::query_as::<_, Registration>("SELECT * FROM session_registrations WHERE session_id = $1 ORDER BY created_at ASC")
            .bind(session_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_waitlist(&self, session_id: &str) -> Result<Vec<WaitlistEntry>, AppError> {
        sqlx::query_as::<_, WaitlistEntry>("SELECT * FROM session_waitlist WHERE session_id = $1 ORDER BY position ASC")
            .bind(session_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn insert_registration(&self, registration: &Registration) -> Result<Option<Registration>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        Self::lock_session(&mut tx, &registration.session_id).await?;

        let created = sqlx::query_as::<_, Registration>(
            r#"INSERT INTO session_registrations (id, session_id, user_id, status, created_at)
               SELECT $1, s.id, $2, $3, $4
               FROM event_sessions s
               WHERE s.id = $5
                 AND (s.max_attendees IS NULL
                      OR s.max_attendees > (SELECT COUNT(*) FROM session_registrations r WHERE r.session_id = s.id))
                 AND NOT EXISTS (SELECT 1 FROM session_waitlist w WHERE w.session_id = s.id AND w.user_id = $2)
               RETURNING *"#
        )
            .bind(&registration.id)
            .bind(&registration.user_id)
            .bind(&registration.status)
            .bind(registration.created_at)
            .bind(&registration.session_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn delete_registration(&self, session_id: &str, user_id: &str) -> Result<Option<Registration>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        Self::lock_session(&mut tx, session_id).await?;

        let removed = sqlx::query_as::<_, Registration>("DELETE FROM session_registrations WHERE session_id = $1 AND user_id = $2 RETURNING *")
            .bind(session_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(removed)
    }

    async fn check_in(&self, session_id: &str, user_id: &str) -> Result<Option<Registration>, AppError> {
        sqlx::query_as::<_, Registration>(
            r#"UPDATE session_registrations
               SET status = 'CHECKED_IN', checked_in_at = COALESCE(checked_in_at, $1)
               WHERE session_id = $2 AND user_id = $3
               RETURNING *"#
        )
            .bind(Utc::now())
            .bind(session_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn insert_waitlist_entry(&self, entry: &WaitlistEntry) -> Result<Option<WaitlistEntry>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        Self::lock_session(&mut tx, &entry.session_id).await?;

        let created = sqlx::query_as::<_, WaitlistEntry>(
            r#"INSERT INTO session_waitlist (id, session_id, user_id, position, status, joined_at)
               SELECT $1, s.id, $2, (SELECT COUNT(*) FROM session_waitlist w WHERE w.session_id = s.id)::INTEGER + 1, $3, $4
               FROM event_sessions s
               WHERE s.id = $5
                 AND s.allow_waitlist
                 AND NOT EXISTS (SELECT 1 FROM session_registrations r WHERE r.session_id = s.id AND r.user_id = $2)
               RETURNING *"#
        )
            .bind(&entry.id)
            .bind(&entry.user_id)
            .bind(&entry.status)
            .bind(entry.joined_at)
            .bind(&entry.session_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn delete_waitlist_entry(&self, session_id: &str, user_id: &str) -> Result<Option<WaitlistEntry>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        Self::lock_session(&mut tx, session_id).await?;

        let removed = sqlx::query_as::<_, WaitlistEntry>("DELETE FROM session_waitlist WHERE session_id = $1 AND user_id = $2 RETURNING *")
            .bind(session_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let Some(removed) = removed else {
            tx.rollback().await.map_err(AppError::Database)?;
            return Ok(None);
        };

        sqlx::query("UPDATE session_waitlist SET position = position - 1 WHERE session_id = $1 AND position > $2")
            .bind(session_id)
            .bind(removed.position)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(Some(removed))
    }

    async fn promote_next(&self, session_id: &str) -> Result<Option<Promotion>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        Self::lock_session(&mut tx, session_id).await?;

        let registration = sqlx::query_as::<_, Registration>(
            r#"INSERT INTO session_registrations (id, session_id, user_id, status, created_at)
               SELECT $1, w.session_id, w.user_id, 'CONFIRMED', $2
               FROM session_waitlist w
               JOIN event_sessions s ON s.id = w.session_id
               WHERE w.session_id = $3
                 AND (s.max_attendees IS NULL
                      OR s.max_attendees > (SELECT COUNT(*) FROM session_registrations r WHERE r.session_id = s.id))
               ORDER BY w.position ASC
               LIMIT 1
               RETURNING *"#
        )
            .bind(Uuid::new_v4().to_string())
            .bind(Utc::now())
            .bind(session_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let Some(registration) = registration else {
            tx.rollback().await.map_err(AppError::Database)?;
            return Ok(None);
        };

        let row = sqlx::query("DELETE FROM session_waitlist WHERE session_id = $1 AND user_id = $2 RETURNING position")
            .bind(session_id)
            .bind(&registration.user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        let previous_position: i32 = row.get("position");

        sqlx::query("UPDATE session_waitlist SET position = position - 1 WHERE session_id = $1 AND position > $2")
            .bind(session_id)
            .bind(previous_position)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(Some(Promotion { registration, previous_position }))
    }
}
