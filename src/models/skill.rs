use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How well a user knows the skill they offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Proficiency {
    Beginner,
    Intermediate,
    Expert,
}

impl Proficiency {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(Proficiency::Beginner),
            "intermediate" => Ok(Proficiency::Intermediate),
            "expert" => Ok(Proficiency::Expert),
            _ => Err(format!("Invalid proficiency: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            Proficiency::Beginner => "beginner",
            Proficiency::Intermediate => "intermediate",
            Proficiency::Expert => "expert",
        }
    }
}

/// Skill offered for barter
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Skill {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub proficiency: String, // Stored as TEXT, use Proficiency enum for type safety
    pub is_available: bool,
    pub created_at: NaiveDateTime,
}

impl Skill {
    /// Get proficiency as an enum
    pub fn proficiency_enum(&self) -> Proficiency {
        Proficiency::from_str(&self.proficiency).unwrap_or(Proficiency::Beginner)
    }
}

/// Input for a new skill listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSkill {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub proficiency: Proficiency,
}
