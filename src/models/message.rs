use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted chat message under a barter request
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub barter_request_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: NaiveDateTime,
}

/// Input for a new message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    pub barter_request_id: Uuid,
    pub content: String,
}
