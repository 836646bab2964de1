use crate::error::{AppError, AppResult};
use crate::models::{ProfileUpdate, PublicProfile, User};
use crate::repositories::UserRepository;
use std::sync::Arc;

const MAX_BIO_LEN: usize = 1000;

/// Profile reads and edits
pub struct UserService {
    user_repo: Arc<UserRepository>,
}

impl UserService {
    pub fn new(user_repo: Arc<UserRepository>) -> Self {
        Self { user_repo }
    }

    pub async fn get_profile(&self, user_id: uuid::Uuid) -> AppResult<PublicProfile> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        Ok(user.into())
    }

    pub async fn update_profile(&self, user: &User, update: &ProfileUpdate) -> AppResult<User> {
        if let Some(bio) = &update.bio {
            if bio.chars().count() > MAX_BIO_LEN {
                return Err(AppError::Validation(format!(
                    "Bio must be at most {} characters",
                    MAX_BIO_LEN
                )));
            }
        }
        if update.display_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::Validation("Display name cannot be empty".to_string()));
        }

        Ok(self.user_repo.update_profile(user.id, update).await?)
    }
}
