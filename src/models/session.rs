use crate::workflow::SessionStatus;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Scheduled meeting under an accepted skill exchange
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub barter_request_id: Uuid,
    pub created_by: Uuid,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub duration_minutes: i32,
    pub status: String, // Stored as TEXT, use SessionStatus enum for type safety
    pub notes: Option<String>,
    pub reschedule_requested_by: Option<Uuid>,
    pub reschedule_date: Option<NaiveDate>,
    pub reschedule_time: Option<NaiveTime>,
    pub reschedule_reason: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Session {
    /// Get status as an enum
    pub fn status_enum(&self) -> SessionStatus {
        SessionStatus::from_str(&self.status).unwrap_or(SessionStatus::Scheduled)
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.scheduled_date.and_time(self.scheduled_time)
    }
}

/// Input for a new session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSession {
    pub barter_request_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub duration_minutes: i32,
    pub notes: Option<String>,
}

/// Proposal to move a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub new_date: NaiveDate,
    pub new_time: NaiveTime,
    pub reason: Option<String>,
}

/// Answer to a pending reschedule proposal
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RescheduleResponse {
    pub accept: bool,
}
