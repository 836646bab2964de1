use crate::workflow::{BarterKind, BarterStatus, Party};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Proposed exchange of a skill or an item between two users
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BarterRequest {
    pub id: Uuid,
    pub request_type: String, // Stored as TEXT, use BarterKind enum for type safety
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub from_skill_id: Option<Uuid>,
    pub to_skill_id: Option<Uuid>,
    pub from_item_id: Option<Uuid>,
    pub to_item_id: Option<Uuid>,
    pub message: Option<String>,
    pub status: String, // Stored as TEXT, use BarterStatus enum for type safety
    pub barter_period: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl BarterRequest {
    /// Get request type as an enum
    pub fn kind(&self) -> BarterKind {
        BarterKind::from_str(&self.request_type).unwrap_or(BarterKind::Skill)
    }

    /// Get status as an enum
    pub fn status_enum(&self) -> BarterStatus {
        BarterStatus::from_str(&self.status).unwrap_or(BarterStatus::Pending)
    }

    /// Which side `user_id` is on, `None` for outsiders
    pub fn party_of(&self, user_id: Uuid) -> Option<Party> {
        Party::of(user_id, self.from_user_id, self.to_user_id)
    }

    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.party_of(user_id).is_some()
    }

    /// The user on the other side of `user_id`
    pub fn counterparty(&self, user_id: Uuid) -> Option<Uuid> {
        match self.party_of(user_id)? {
            Party::Requester => Some(self.to_user_id),
            Party::Recipient => Some(self.from_user_id),
        }
    }
}

/// Input for a new barter request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBarterRequest {
    #[serde(rename = "type")]
    pub request_type: BarterKind,
    pub to_user_id: Uuid,
    pub from_skill_id: Option<Uuid>,
    pub to_skill_id: Option<Uuid>,
    pub from_item_id: Option<Uuid>,
    pub to_item_id: Option<Uuid>,
    pub message: Option<String>,
    pub barter_period: Option<String>,
}

/// Which side of the request list to return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestDirection {
    Incoming,
    Outgoing,
}

impl RequestDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestDirection::Incoming => "incoming",
            RequestDirection::Outgoing => "outgoing",
        }
    }
}

/// Body of `PUT /barter/:id/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: BarterStatus,
}

/// Requests a user sent and received
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BarterRequestLists {
    pub incoming: Vec<BarterRequest>,
    pub outgoing: Vec<BarterRequest>,
}

/// One row of the activity feed: a request plus the caller's role in it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarterActivity {
    pub request: BarterRequest,
    pub role: Party,
    pub counterparty_id: Uuid,
    /// Statuses the caller can move the request to right now
    pub available_statuses: Vec<BarterStatus>,
}
