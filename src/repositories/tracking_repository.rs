use super::barter_repository::update_status_in;
use crate::error::{RepoResult, RepositoryError};
use crate::models::{BarterRequest, TrackingRecord};
use crate::workflow::{BarterStatus, TrackingStep};
use sqlx::PgPool;
use uuid::Uuid;

const TRACKING_COLUMNS: &str = "id, barter_request_id, \
    item_packed, item_packed_at, package_sent, package_sent_at, \
    package_delivered, package_delivered_at, exchange_started, exchange_started_at, \
    return_packed, return_packed_at, return_sent, return_sent_at, \
    return_delivered, return_delivered_at, exchange_completed, exchange_completed_at, \
    created_at, updated_at";

/// Repository for item tracking records
pub struct TrackingRepository {
    pool: PgPool,
}

impl TrackingRepository {
    /// Create a new TrackingRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a record with every step open
    pub async fn create(&self, barter_request_id: Uuid) -> RepoResult<TrackingRecord> {
        let record = sqlx::query_as::<_, TrackingRecord>(&format!(
            r#"
            INSERT INTO tracking_records (barter_request_id)
            VALUES ($1)
            RETURNING {TRACKING_COLUMNS}
            "#
        ))
        .bind(barter_request_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    /// Find a record by UUID
    pub async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<TrackingRecord>> {
        let record = sqlx::query_as::<_, TrackingRecord>(&format!(
            "SELECT {TRACKING_COLUMNS} FROM tracking_records WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// Find the record of a request
    pub async fn find_by_request(
        &self,
        barter_request_id: Uuid,
    ) -> RepoResult<Option<TrackingRecord>> {
        let record = sqlx::query_as::<_, TrackingRecord>(&format!(
            "SELECT {TRACKING_COLUMNS} FROM tracking_records WHERE barter_request_id = $1"
        ))
        .bind(barter_request_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// Complete `step` and apply its request status change in one transaction.
    ///
    /// The UPDATE re-checks the gate (step open, previous step done) so two
    /// concurrent calls cannot both complete the same step.
    pub async fn complete_step(
        &self,
        record: &TrackingRecord,
        step: TrackingStep,
        status_change: Option<(BarterStatus, BarterStatus)>,
    ) -> RepoResult<(TrackingRecord, Option<BarterRequest>)> {
        let column = step.as_str();
        let previous_guard = step
            .previous()
            .map(|prev| format!(" AND {} = TRUE", prev.as_str()))
            .unwrap_or_default();

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, TrackingRecord>(&format!(
            r#"
            UPDATE tracking_records
            SET {column} = TRUE, {column}_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND {column} = FALSE{previous_guard}
            RETURNING {TRACKING_COLUMNS}
            "#
        ))
        .bind(record.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            RepositoryError::Conflict(format!("Step {} can no longer be completed", column))
        })?;

        let request = match status_change {
            Some((from, to)) => {
                Some(update_status_in(&mut *tx, record.barter_request_id, from, to).await?)
            }
            None => None,
        };

        tx.commit().await?;
        Ok((updated, request))
    }
}
