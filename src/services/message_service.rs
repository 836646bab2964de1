use crate::error::{AppError, AppResult};
use crate::models::{BarterRequest, Message};
use crate::repositories::{BarterRepository, MessageRepository};
use crate::workflow::WorkflowError;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Longest accepted chat message, in characters
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Chat history of barter requests
pub struct MessageService {
    message_repo: Arc<MessageRepository>,
    barter_repo: Arc<BarterRepository>,
}

impl MessageService {
    pub fn new(message_repo: Arc<MessageRepository>, barter_repo: Arc<BarterRepository>) -> Self {
        Self {
            message_repo,
            barter_repo,
        }
    }

    /// History of a request, oldest first
    pub async fn history(&self, user_id: Uuid, request_id: Uuid) -> AppResult<Vec<Message>> {
        let request = self.participant_request(user_id, request_id).await?;
        Ok(self.message_repo.find_by_request(request.id).await?)
    }

    /// Persist a message from one of the parties
    pub async fn post(&self, user_id: Uuid, request_id: Uuid, content: &str) -> AppResult<Message> {
        let content = validate_content(content)?;
        let request = self.participant_request(user_id, request_id).await?;
        let message = self.message_repo.create(request.id, user_id, content).await?;
        debug!("Message {} stored for request {}", message.id, request.id);
        Ok(message)
    }

    /// Whether `user_id` may read and write the chat of `request_id`
    pub async fn is_participant(&self, user_id: Uuid, request_id: Uuid) -> AppResult<bool> {
        Ok(self
            .barter_repo
            .find_by_id(request_id)
            .await?
            .is_some_and(|r| r.is_participant(user_id)))
    }

    async fn participant_request(&self, user_id: Uuid, request_id: Uuid) -> AppResult<BarterRequest> {
        let request = self
            .barter_repo
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Barter request not found".to_string()))?;
        if !request.is_participant(user_id) {
            return Err(WorkflowError::NotParticipant.into());
        }
        Ok(request)
    }
}

/// Trimmed message body, 1..=2000 characters
pub fn validate_content(content: &str) -> AppResult<&str> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("Message cannot be empty".to_string()));
    }
    if content.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "Message must be at most {} characters",
            MAX_MESSAGE_CHARS
        )));
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_bounds() {
        assert_eq!(validate_content("  hi there ").unwrap(), "hi there");
        assert!(validate_content("   ").is_err());
        assert!(validate_content(&"é".repeat(MAX_MESSAGE_CHARS)).is_ok());
        assert!(validate_content(&"é".repeat(MAX_MESSAGE_CHARS + 1)).is_err());
    }
}
