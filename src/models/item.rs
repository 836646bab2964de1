use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Physical condition of a listed item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCondition {
    New,
    LikeNew,
    Good,
    Fair,
    Poor,
}

impl ItemCondition {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "new" => Ok(ItemCondition::New),
            "like_new" => Ok(ItemCondition::LikeNew),
            "good" => Ok(ItemCondition::Good),
            "fair" => Ok(ItemCondition::Fair),
            "poor" => Ok(ItemCondition::Poor),
            _ => Err(format!("Invalid condition: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCondition::New => "new",
            ItemCondition::LikeNew => "like_new",
            ItemCondition::Good => "good",
            ItemCondition::Fair => "fair",
            ItemCondition::Poor => "poor",
        }
    }
}

/// Physical item offered for barter
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub condition: String, // Stored as TEXT, use ItemCondition enum for type safety
    pub image_url: Option<String>,
    pub is_available: bool,
    pub created_at: NaiveDateTime,
}

impl Item {
    /// Get condition as an enum
    pub fn condition_enum(&self) -> ItemCondition {
        ItemCondition::from_str(&self.condition).unwrap_or(ItemCondition::Good)
    }
}

/// Input for a new item listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub condition: ItemCondition,
    pub image_url: Option<String>,
}

/// Filters shared by the skill and item listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub user_id: Option<Uuid>,
}
