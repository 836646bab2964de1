use crate::error::{RepoResult, RepositoryError};
use crate::models::{ProfileUpdate, User};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, password_hash, \
    display_name, bio, location, points, created_at";

/// Repository for user data access
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new user
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        points: i32,
    ) -> RepoResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, points)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(points)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    /// Find a user by UUID
    pub async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Find a user by username or email (case-insensitive)
    pub async fn find_by_login(&self, login: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($1)
            LIMIT 1
            "#
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Update profile fields; missing fields keep their value
    pub async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> RepoResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET display_name = COALESCE($2, display_name),
                bio = COALESCE($3, bio),
                location = COALESCE($4, location)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.display_name.as_deref())
        .bind(update.bio.as_deref())
        .bind(update.location.as_deref())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound("User not found".to_string()))?;
        Ok(user)
    }

    /// Add `delta` points (negative to charge); never lets the balance go below zero
    pub async fn adjust_points(&self, id: Uuid, delta: i32) -> RepoResult<User> {
        let mut conn = self.pool.acquire().await?;
        adjust_points_in(&mut *conn, id, delta).await
    }
}

/// Point adjustment usable inside another repository's transaction
pub(crate) async fn adjust_points_in(
    conn: &mut sqlx::PgConnection,
    id: Uuid,
    delta: i32,
) -> RepoResult<User> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET points = points + $2
        WHERE id = $1 AND points + $2 >= 0
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(delta)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| RepositoryError::BusinessRule("Insufficient points".to_string()))
}
