use super::user_repository::adjust_points_in;
use crate::error::{RepoResult, RepositoryError};
use crate::models::{Poll, PollVote};
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for polls and votes
pub struct PollRepository {
    pool: PgPool,
}

impl PollRepository {
    /// Create a new PollRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a poll and charge its author `cost` points in one transaction
    pub async fn create(
        &self,
        user_id: Uuid,
        question: &str,
        options: &serde_json::Value,
        cost: i32,
    ) -> RepoResult<Poll> {
        let mut tx = self.pool.begin().await?;

        if cost > 0 {
            adjust_points_in(&mut *tx, user_id, -cost).await?;
        }

        let poll = sqlx::query_as::<_, Poll>(
            r#"
            INSERT INTO polls (user_id, question, options)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, question, options, created_at
            "#,
        )
        .bind(user_id)
        .bind(question)
        .bind(options)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(poll)
    }

    /// Find a poll by UUID
    pub async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Poll>> {
        let poll = sqlx::query_as::<_, Poll>(
            "SELECT id, user_id, question, options, created_at FROM polls WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(poll)
    }

    /// All polls, newest first
    pub async fn list(&self) -> RepoResult<Vec<Poll>> {
        let polls = sqlx::query_as::<_, Poll>(
            "SELECT id, user_id, question, options, created_at FROM polls ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(polls)
    }

    /// Vote counts as `(poll_id, option_index, count)`
    pub async fn vote_counts(&self, poll_ids: &[Uuid]) -> RepoResult<Vec<(Uuid, i32, i64)>> {
        let counts = sqlx::query_as::<_, (Uuid, i32, i64)>(
            r#"
            SELECT poll_id, option_index, COUNT(*)
            FROM poll_votes
            WHERE poll_id = ANY($1)
            GROUP BY poll_id, option_index
            "#,
        )
        .bind(poll_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }

    /// A user's votes on the given polls as `(poll_id, option_index)`
    pub async fn user_votes(&self, user_id: Uuid, poll_ids: &[Uuid]) -> RepoResult<Vec<(Uuid, i32)>> {
        let votes = sqlx::query_as::<_, (Uuid, i32)>(
            "SELECT poll_id, option_index FROM poll_votes WHERE user_id = $1 AND poll_id = ANY($2)",
        )
        .bind(user_id)
        .bind(poll_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(votes)
    }

    /// Record a vote and pay the voter `reward` points in one transaction.
    /// A second vote by the same user fails with `Duplicate`.
    pub async fn record_vote(
        &self,
        poll_id: Uuid,
        user_id: Uuid,
        option_index: i32,
        reward: i32,
    ) -> RepoResult<PollVote> {
        let mut tx = self.pool.begin().await?;

        let vote = sqlx::query_as::<_, PollVote>(
            r#"
            INSERT INTO poll_votes (poll_id, user_id, option_index)
            VALUES ($1, $2, $3)
            RETURNING poll_id, user_id, option_index, created_at
            "#,
        )
        .bind(poll_id)
        .bind(user_id)
        .bind(option_index)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match RepositoryError::from(e) {
            RepositoryError::Duplicate(_) => {
                RepositoryError::Duplicate("You have already voted on this poll".to_string())
            }
            other => other,
        })?;

        if reward > 0 {
            adjust_points_in(&mut *tx, user_id, reward).await?;
        }

        tx.commit().await?;
        Ok(vote)
    }
}
