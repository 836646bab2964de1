use crate::error::RepoResult;
use crate::models::{ListingFilter, NewSkill, Skill};
use sqlx::PgPool;
use uuid::Uuid;

const SKILL_COLUMNS: &str =
    "id, user_id, title, description, category, proficiency, is_available, created_at";

/// Repository for skill listings
pub struct SkillRepository {
    pool: PgPool,
}

impl SkillRepository {
    /// Create a new SkillRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new skill
    pub async fn create(&self, user_id: Uuid, skill: &NewSkill) -> RepoResult<Skill> {
        let skill = sqlx::query_as::<_, Skill>(&format!(
            r#"
            INSERT INTO skills (user_id, title, description, category, proficiency)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SKILL_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(skill.title.trim())
        .bind(skill.description.as_deref())
        .bind(skill.category.trim())
        .bind(skill.proficiency.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(skill)
    }

    /// Find a skill by UUID
    pub async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Skill>> {
        let skill = sqlx::query_as::<_, Skill>(&format!(
            "SELECT {SKILL_COLUMNS} FROM skills WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(skill)
    }

    /// List skills, newest first, narrowed by the optional filters
    pub async fn list(&self, filter: &ListingFilter) -> RepoResult<Vec<Skill>> {
        let skills = sqlx::query_as::<_, Skill>(&format!(
            r#"
            SELECT {SKILL_COLUMNS}
            FROM skills
            WHERE ($1::TEXT IS NULL OR LOWER(category) = LOWER($1))
              AND ($2::TEXT IS NULL OR title ILIKE '%' || $2 || '%' OR description ILIKE '%' || $2 || '%')
              AND ($3::UUID IS NULL OR user_id = $3)
            ORDER BY created_at DESC
            "#
        ))
        .bind(filter.category.as_deref())
        .bind(filter.search.as_deref())
        .bind(filter.user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(skills)
    }

    /// Delete a skill owned by `user_id`
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        let rows_affected = sqlx::query("DELETE FROM skills WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows_affected > 0)
    }
}
