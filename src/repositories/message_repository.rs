use crate::error::RepoResult;
use crate::models::Message;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for chat history
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    /// Create a new MessageRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a message
    pub async fn create(
        &self,
        barter_request_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> RepoResult<Message> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (barter_request_id, sender_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, barter_request_id, sender_id, content, created_at
            "#,
        )
        .bind(barter_request_id)
        .bind(sender_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }

    /// History of a request, oldest first
    pub async fn find_by_request(&self, barter_request_id: Uuid) -> RepoResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, barter_request_id, sender_id, content, created_at
            FROM messages
            WHERE barter_request_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(barter_request_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }
}
