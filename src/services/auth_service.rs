use crate::auth;
use crate::error::{AppError, AppResult, RepositoryError};
use crate::models::{AuthResponse, LoginRequest, ProfileUpdate, RegisterRequest, User};
use crate::repositories::{TokenRepository, UserRepository};
use std::sync::Arc;
use tracing::{debug, info};

/// Accounts and bearer tokens
pub struct AuthService {
    user_repo: Arc<UserRepository>,
    token_repo: Arc<TokenRepository>,
    token_ttl: chrono::Duration,
    starting_points: i32,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<UserRepository>,
        token_repo: Arc<TokenRepository>,
        token_ttl: chrono::Duration,
        starting_points: i32,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            token_ttl,
            starting_points,
        }
    }

    /// Create an account and log it in
    pub async fn register(&self, form: &RegisterRequest) -> AppResult<AuthResponse> {
        auth::validate_registration(&form.username, &form.email, &form.password)?;

        let hash = auth::hash_password(&form.password)?;

        let mut user = self
            .user_repo
            .create(
                form.username.trim(),
                &form.email.trim().to_lowercase(),
                &hash,
                self.starting_points,
            )
            .await
            .map_err(|e| match e {
                RepositoryError::Duplicate(_) => {
                    AppError::BusinessLogic("Username or email is already taken".to_string())
                }
                other => other.into(),
            })?;

        if let Some(display_name) = form.display_name.as_deref().map(str::trim) {
            if !display_name.is_empty() {
                let update = ProfileUpdate {
                    display_name: Some(display_name.to_string()),
                    ..ProfileUpdate::default()
                };
                user = self.user_repo.update_profile(user.id, &update).await?;
            }
        }

        info!("Registered user {} ({})", user.username, user.id);
        self.issue_token(user).await
    }

    /// Exchange credentials for a fresh token
    pub async fn login(&self, form: &LoginRequest) -> AppResult<AuthResponse> {
        let invalid = || AppError::Unauthorized("Invalid login or password".to_string());

        let user = self
            .user_repo
            .find_by_login(form.login.trim())
            .await?
            .ok_or_else(invalid)?;

        if !auth::verify_password(&form.password, &user.password_hash) {
            debug!("Password mismatch for {}", user.id);
            return Err(invalid());
        }

        info!("User {} logged in", user.id);
        self.issue_token(user).await
    }

    /// Revoke the token used for this call
    pub async fn logout(&self, token: &str) -> AppResult<()> {
        self.token_repo.delete(&auth::hash_token(token)).await?;
        Ok(())
    }

    /// Resolve a bearer token to its user
    pub async fn authenticate(&self, token: &str) -> AppResult<User> {
        self.token_repo
            .find_user(&auth::hash_token(token))
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))
    }

    /// Remove expired tokens
    pub async fn purge_expired_tokens(&self) -> AppResult<u64> {
        let removed = self.token_repo.delete_expired().await?;
        if removed > 0 {
            info!("Purged {} expired tokens", removed);
        }
        Ok(removed)
    }

    async fn issue_token(&self, user: User) -> AppResult<AuthResponse> {
        let token = auth::generate_token();
        let expires_at = chrono::Utc::now().naive_utc() + self.token_ttl;
        self.token_repo
            .create(&auth::hash_token(&token), user.id, expires_at)
            .await?;

        Ok(AuthResponse {
            token,
            expires_at,
            user,
        })
    }
}
