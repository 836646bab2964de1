use crate::error::{RepoResult, RepositoryError};
use crate::models::{BarterRequest, NewBarterRequest};
use crate::workflow::BarterStatus;
use sqlx::PgPool;
use uuid::Uuid;

pub(crate) const BARTER_COLUMNS: &str = "id, request_type, from_user_id, to_user_id, \
    from_skill_id, to_skill_id, from_item_id, to_item_id, message, status, barter_period, \
    created_at, updated_at";

/// Repository for barter requests
pub struct BarterRepository {
    pool: PgPool,
}

impl BarterRepository {
    /// Create a new BarterRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new request in `pending`
    pub async fn create(
        &self,
        from_user_id: Uuid,
        request: &NewBarterRequest,
    ) -> RepoResult<BarterRequest> {
        let created = sqlx::query_as::<_, BarterRequest>(&format!(
            r#"
            INSERT INTO barter_requests (
                request_type, from_user_id, to_user_id,
                from_skill_id, to_skill_id, from_item_id, to_item_id,
                message, barter_period
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {BARTER_COLUMNS}
            "#
        ))
        .bind(request.request_type.as_str())
        .bind(from_user_id)
        .bind(request.to_user_id)
        .bind(request.from_skill_id)
        .bind(request.to_skill_id)
        .bind(request.from_item_id)
        .bind(request.to_item_id)
        .bind(request.message.as_deref())
        .bind(request.barter_period.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// Find a request by UUID
    pub async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<BarterRequest>> {
        let request = sqlx::query_as::<_, BarterRequest>(&format!(
            "SELECT {BARTER_COLUMNS} FROM barter_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(request)
    }

    /// Requests addressed to a user
    pub async fn find_incoming(&self, user_id: Uuid) -> RepoResult<Vec<BarterRequest>> {
        let requests = sqlx::query_as::<_, BarterRequest>(&format!(
            r#"
            SELECT {BARTER_COLUMNS}
            FROM barter_requests
            WHERE to_user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    /// Requests a user sent
    pub async fn find_outgoing(&self, user_id: Uuid) -> RepoResult<Vec<BarterRequest>> {
        let requests = sqlx::query_as::<_, BarterRequest>(&format!(
            r#"
            SELECT {BARTER_COLUMNS}
            FROM barter_requests
            WHERE from_user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    /// Every request a user is party to, most recently changed first
    pub async fn find_activity(&self, user_id: Uuid) -> RepoResult<Vec<BarterRequest>> {
        let requests = sqlx::query_as::<_, BarterRequest>(&format!(
            r#"
            SELECT {BARTER_COLUMNS}
            FROM barter_requests
            WHERE from_user_id = $1 OR to_user_id = $1
            ORDER BY updated_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    /// Whether the requester already has a pending request for the same asset
    pub async fn has_pending_duplicate(
        &self,
        from_user_id: Uuid,
        to_skill_id: Option<Uuid>,
        to_item_id: Option<Uuid>,
    ) -> RepoResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM barter_requests
                WHERE from_user_id = $1
                  AND status = 'pending'
                  AND to_skill_id IS NOT DISTINCT FROM $2
                  AND to_item_id IS NOT DISTINCT FROM $3
            )
            "#,
        )
        .bind(from_user_id)
        .bind(to_skill_id)
        .bind(to_item_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Move a request from `expected` to `next`.
    /// Fails with a conflict if the status changed since it was read.
    pub async fn update_status(
        &self,
        id: Uuid,
        expected: BarterStatus,
        next: BarterStatus,
    ) -> RepoResult<BarterRequest> {
        let mut conn = self.pool.acquire().await?;
        update_status_in(&mut *conn, id, expected, next).await
    }

    /// Accept a pending item request and take the item off the market in
    /// one transaction. Fails with a conflict if the item is already lent.
    pub async fn accept_item_request(&self, id: Uuid, item_id: Uuid) -> RepoResult<BarterRequest> {
        let mut tx = self.pool.begin().await?;

        let reserved = sqlx::query(
            "UPDATE items SET is_available = FALSE WHERE id = $1 AND is_available = TRUE",
        )
        .bind(item_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if reserved == 0 {
            return Err(RepositoryError::Conflict(
                "Requested item is no longer available".to_string(),
            ));
        }

        let accepted =
            update_status_in(&mut *tx, id, BarterStatus::Pending, BarterStatus::Accepted).await?;

        tx.commit().await?;
        Ok(accepted)
    }

    /// Whether a listing is still referenced by a request that has not ended
    pub async fn has_open_requests_for(
        &self,
        skill_id: Option<Uuid>,
        item_id: Option<Uuid>,
    ) -> RepoResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM barter_requests
                WHERE status NOT IN ('declined', 'cancelled', 'completed')
                  AND (($1::UUID IS NOT NULL AND $1 IN (from_skill_id, to_skill_id))
                    OR ($2::UUID IS NOT NULL AND $2 IN (from_item_id, to_item_id)))
            )
            "#,
        )
        .bind(skill_id)
        .bind(item_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

/// Status update usable inside another repository's transaction
pub(crate) async fn update_status_in(
    conn: &mut sqlx::PgConnection,
    id: Uuid,
    expected: BarterStatus,
    next: BarterStatus,
) -> RepoResult<BarterRequest> {
    sqlx::query_as::<_, BarterRequest>(&format!(
        r#"
        UPDATE barter_requests
        SET status = $3, updated_at = NOW()
        WHERE id = $1 AND status = $2
        RETURNING {BARTER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(expected.as_str())
    .bind(next.as_str())
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| {
        RepositoryError::Conflict(format!(
            "Request is no longer {}",
            expected.as_str()
        ))
    })
}
