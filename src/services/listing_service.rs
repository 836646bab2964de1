use crate::error::{AppError, AppResult};
use crate::models::{Item, ListingFilter, NewItem, NewSkill, Skill};
use crate::repositories::{BarterRepository, ItemRepository, SkillRepository};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const MAX_TITLE_LEN: usize = 120;

/// Skill and item listings
pub struct ListingService {
    skill_repo: Arc<SkillRepository>,
    item_repo: Arc<ItemRepository>,
    barter_repo: Arc<BarterRepository>,
}

impl ListingService {
    pub fn new(
        skill_repo: Arc<SkillRepository>,
        item_repo: Arc<ItemRepository>,
        barter_repo: Arc<BarterRepository>,
    ) -> Self {
        Self {
            skill_repo,
            item_repo,
            barter_repo,
        }
    }

    pub async fn list_skills(&self, filter: &ListingFilter) -> AppResult<Vec<Skill>> {
        Ok(self.skill_repo.list(&normalize(filter)).await?)
    }

    pub async fn create_skill(&self, user_id: Uuid, skill: &NewSkill) -> AppResult<Skill> {
        validate_listing(&skill.title, &skill.category)?;
        let skill = self.skill_repo.create(user_id, skill).await?;
        info!("User {} listed skill {}", user_id, skill.id);
        Ok(skill)
    }

    pub async fn delete_skill(&self, user_id: Uuid, skill_id: Uuid) -> AppResult<()> {
        let skill = self
            .skill_repo
            .find_by_id(skill_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Skill not found".to_string()))?;
        if skill.user_id != user_id {
            return Err(AppError::Forbidden("You can only delete your own skills".to_string()));
        }
        if self.barter_repo.has_open_requests_for(Some(skill_id), None).await? {
            return Err(AppError::BusinessLogic(
                "Skill is part of an open barter request".to_string(),
            ));
        }
        self.skill_repo.delete(skill_id, user_id).await?;
        Ok(())
    }

    pub async fn list_items(&self, filter: &ListingFilter) -> AppResult<Vec<Item>> {
        Ok(self.item_repo.list(&normalize(filter)).await?)
    }

    pub async fn create_item(&self, user_id: Uuid, item: &NewItem) -> AppResult<Item> {
        validate_listing(&item.title, &item.category)?;
        let item = self.item_repo.create(user_id, item).await?;
        info!("User {} listed item {}", user_id, item.id);
        Ok(item)
    }

    pub async fn delete_item(&self, user_id: Uuid, item_id: Uuid) -> AppResult<()> {
        let item = self
            .item_repo
            .find_by_id(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;
        if item.user_id != user_id {
            return Err(AppError::Forbidden("You can only delete your own items".to_string()));
        }
        if self.barter_repo.has_open_requests_for(None, Some(item_id)).await? {
            return Err(AppError::BusinessLogic(
                "Item is part of an open barter request".to_string(),
            ));
        }
        self.item_repo.delete(item_id, user_id).await?;
        Ok(())
    }
}

/// Blank filter values mean "no filter"
fn normalize(filter: &ListingFilter) -> ListingFilter {
    let non_blank = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    ListingFilter {
        category: non_blank(&filter.category),
        search: non_blank(&filter.search),
        user_id: filter.user_id,
    }
}

fn validate_listing(title: &str, category: &str) -> AppResult<()> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::Validation(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    if category.trim().is_empty() {
        return Err(AppError::Validation("Category is required".to_string()));
    }
    Ok(())
}
