use super::barter_repository::update_status_in;
use crate::error::{RepoResult, RepositoryError};
use crate::models::{BarterRequest, NewSession, RescheduleRequest, Session};
use crate::workflow::{BarterStatus, SessionStatus};
use sqlx::PgPool;
use uuid::Uuid;

const SESSION_COLUMNS: &str = "id, barter_request_id, created_by, scheduled_date, \
    scheduled_time, duration_minutes, status, notes, reschedule_requested_by, \
    reschedule_date, reschedule_time, reschedule_reason, created_at, updated_at";

/// Repository for skill exchange sessions
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new SessionRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a session in `scheduled`
    pub async fn create(&self, created_by: Uuid, session: &NewSession) -> RepoResult<Session> {
        let created = sqlx::query_as::<_, Session>(&format!(
            r#"
            INSERT INTO barter_sessions (
                barter_request_id, created_by, scheduled_date, scheduled_time,
                duration_minutes, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(session.barter_request_id)
        .bind(created_by)
        .bind(session.scheduled_date)
        .bind(session.scheduled_time)
        .bind(session.duration_minutes)
        .bind(session.notes.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// Find a session by UUID
    pub async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM barter_sessions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    /// Sessions of a request in chronological order
    pub async fn find_by_request(&self, barter_request_id: Uuid) -> RepoResult<Vec<Session>> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM barter_sessions
            WHERE barter_request_id = $1
            ORDER BY scheduled_date ASC, scheduled_time ASC
            "#
        ))
        .bind(barter_request_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    /// Move a session from `expected` to `next`, optionally moving its
    /// request too, in one transaction. A request that already reached the
    /// target status is left alone and reported as `None`.
    pub async fn update_status(
        &self,
        id: Uuid,
        expected: SessionStatus,
        next: SessionStatus,
        request_change: Option<(Uuid, BarterStatus, BarterStatus)>,
    ) -> RepoResult<(Session, Option<BarterRequest>)> {
        let mut tx = self.pool.begin().await?;

        let session = sqlx::query_as::<_, Session>(&format!(
            r#"
            UPDATE barter_sessions
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(expected.as_str())
        .bind(next.as_str())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| conflict(expected))?;

        let request = match request_change {
            Some((request_id, from, to)) => {
                match update_status_in(&mut *tx, request_id, from, to).await {
                    Ok(moved) => Some(moved),
                    Err(RepositoryError::Conflict(msg)) => {
                        let current: Option<String> = sqlx::query_scalar(
                            "SELECT status FROM barter_requests WHERE id = $1",
                        )
                        .bind(request_id)
                        .fetch_optional(&mut *tx)
                        .await?;
                        if current.as_deref() != Some(to.as_str()) {
                            return Err(RepositoryError::Conflict(msg));
                        }
                        None
                    }
                    Err(e) => return Err(e),
                }
            }
            None => None,
        };

        tx.commit().await?;
        Ok((session, request))
    }

    /// Record a reschedule proposal
    pub async fn request_reschedule(
        &self,
        id: Uuid,
        requested_by: Uuid,
        proposal: &RescheduleRequest,
    ) -> RepoResult<Session> {
        sqlx::query_as::<_, Session>(&format!(
            r#"
            UPDATE barter_sessions
            SET reschedule_requested_by = $2,
                reschedule_date = $3,
                reschedule_time = $4,
                reschedule_reason = $5,
                updated_at = NOW()
            WHERE id = $1
              AND reschedule_requested_by IS NULL
              AND status IN ('scheduled', 'confirmed')
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(requested_by)
        .bind(proposal.new_date)
        .bind(proposal.new_time)
        .bind(proposal.reason.as_deref())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::Conflict("Session cannot be rescheduled now".to_string()))
    }

    /// Close a reschedule proposal. Accepting moves the session to the
    /// proposed slot with status `next_status`.
    pub async fn resolve_reschedule(
        &self,
        id: Uuid,
        accept: bool,
        next_status: SessionStatus,
    ) -> RepoResult<Session> {
        sqlx::query_as::<_, Session>(&format!(
            r#"
            UPDATE barter_sessions
            SET scheduled_date = CASE WHEN $2 THEN reschedule_date ELSE scheduled_date END,
                scheduled_time = CASE WHEN $2 THEN reschedule_time ELSE scheduled_time END,
                status = $3,
                reschedule_requested_by = NULL,
                reschedule_date = NULL,
                reschedule_time = NULL,
                reschedule_reason = NULL,
                updated_at = NOW()
            WHERE id = $1
              AND reschedule_requested_by IS NOT NULL
              AND status IN ('scheduled', 'confirmed')
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(accept)
        .bind(next_status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::Conflict("No reschedule is pending".to_string()))
    }
}

fn conflict(expected: SessionStatus) -> RepositoryError {
    RepositoryError::Conflict(format!("Session is no longer {}", expected.as_str()))
}
