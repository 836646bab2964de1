use crate::error::RepoResult;
use crate::models::{Item, ListingFilter, NewItem};
use sqlx::PgPool;
use uuid::Uuid;

const ITEM_COLUMNS: &str =
    "id, user_id, title, description, category, condition, image_url, is_available, created_at";

/// Repository for item listings
pub struct ItemRepository {
    pool: PgPool,
}

impl ItemRepository {
    /// Create a new ItemRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new item
    pub async fn create(&self, user_id: Uuid, item: &NewItem) -> RepoResult<Item> {
        let item = sqlx::query_as::<_, Item>(&format!(
            r#"
            INSERT INTO items (user_id, title, description, category, condition, image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(item.title.trim())
        .bind(item.description.as_deref())
        .bind(item.category.trim())
        .bind(item.condition.as_str())
        .bind(item.image_url.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    /// Find an item by UUID
    pub async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    /// List items, newest first, narrowed by the optional filters
    pub async fn list(&self, filter: &ListingFilter) -> RepoResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM items
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
        Ok(items)
    }

    /// Flip availability, e.g. while the item is lent out
    pub async fn set_available(&self, id: Uuid, is_available: bool) -> RepoResult<bool> {
        let rows_affected = sqlx::query("UPDATE items SET is_available = $2 WHERE id = $1")
            .bind(id)
            .bind(is_available)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows_affected > 0)
    }

    /// Delete an item owned by `user_id`
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        let rows_affected = sqlx::query("DELETE FROM items WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows_affected > 0)
    }
}
