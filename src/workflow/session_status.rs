use super::{WorkflowError, WorkflowResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Skill session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Scheduled,
    Confirmed,
    Cancelled,
    Completed,
}

impl SessionStatus {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "scheduled" => Ok(SessionStatus::Scheduled),
            "confirmed" => Ok(SessionStatus::Confirmed),
            "cancelled" => Ok(SessionStatus::Cancelled),
            "completed" => Ok(SessionStatus::Completed),
            _ => Err(format!("Invalid session status: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Confirmed => "confirmed",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Completed => "completed",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, SessionStatus::Scheduled | SessionStatus::Confirmed)
    }

    /// The party that did not create the session confirms it
    pub fn confirm(self, actor_is_creator: bool) -> WorkflowResult<SessionStatus> {
        if self != SessionStatus::Scheduled {
            return Err(self.invalid(SessionStatus::Confirmed));
        }
        if actor_is_creator {
            return Err(WorkflowError::NotPermitted(
                "a session is confirmed by the other party".to_string(),
            ));
        }
        Ok(SessionStatus::Confirmed)
    }

    pub fn cancel(self) -> WorkflowResult<SessionStatus> {
        if !self.is_open() {
            return Err(self.invalid(SessionStatus::Cancelled));
        }
        Ok(SessionStatus::Cancelled)
    }

    pub fn complete(self) -> WorkflowResult<SessionStatus> {
        if self != SessionStatus::Confirmed {
            return Err(self.invalid(SessionStatus::Completed));
        }
        Ok(SessionStatus::Completed)
    }

    /// A reschedule can be proposed while the session is open and no other proposal is pending
    pub fn check_reschedule_request(
        self,
        pending_request_by: Option<Uuid>,
    ) -> WorkflowResult<()> {
        if !self.is_open() {
            return Err(WorkflowError::NotPermitted(format!(
                "a {} session cannot be rescheduled",
                self.as_str()
            )));
        }
        if pending_request_by.is_some() {
            return Err(WorkflowError::NotPermitted(
                "a reschedule is already pending".to_string(),
            ));
        }
        Ok(())
    }

    /// Only the party that did not propose the reschedule answers it.
    /// Accepting returns the session to scheduled so it gets confirmed again.
    pub fn respond_reschedule(
        self,
        pending_request_by: Option<Uuid>,
        actor: Uuid,
        accept: bool,
    ) -> WorkflowResult<SessionStatus> {
        let requested_by = pending_request_by.ok_or_else(|| {
            WorkflowError::NotPermitted("no reschedule is pending".to_string())
        })?;
        if requested_by == actor {
            return Err(WorkflowError::NotPermitted(
                "a reschedule is answered by the other party".to_string(),
            ));
        }
        if !self.is_open() {
            return Err(self.invalid(SessionStatus::Scheduled));
        }
        Ok(if accept { SessionStatus::Scheduled } else { self })
    }

    fn invalid(self, to: SessionStatus) -> WorkflowError {
        WorkflowError::InvalidTransition {
            from: self.as_str().to_string(),
            to: to.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creator_cannot_confirm() {
        assert!(SessionStatus::Scheduled.confirm(true).is_err());
        assert_eq!(SessionStatus::Scheduled.confirm(false), Ok(SessionStatus::Confirmed));
        assert!(SessionStatus::Confirmed.confirm(false).is_err());
    }

    #[test]
    fn test_complete_requires_confirmation() {
        assert!(SessionStatus::Scheduled.complete().is_err());
        assert_eq!(SessionStatus::Confirmed.complete(), Ok(SessionStatus::Completed));
    }

    #[test]
    fn test_closed_sessions_cannot_be_cancelled() {
        assert!(SessionStatus::Completed.cancel().is_err());
        assert!(SessionStatus::Cancelled.cancel().is_err());
        assert_eq!(SessionStatus::Confirmed.cancel(), Ok(SessionStatus::Cancelled));
    }

    #[test]
    fn test_reschedule_round() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        assert!(SessionStatus::Confirmed.check_reschedule_request(None).is_ok());
        assert!(SessionStatus::Confirmed.check_reschedule_request(Some(alice)).is_err());

        assert!(SessionStatus::Confirmed.respond_reschedule(Some(alice), alice, true).is_err());
        assert_eq!(
            SessionStatus::Confirmed.respond_reschedule(Some(alice), bob, true),
            Ok(SessionStatus::Scheduled)
        );
        assert_eq!(
            SessionStatus::Confirmed.respond_reschedule(Some(alice), bob, false),
            Ok(SessionStatus::Confirmed)
        );
        assert!(SessionStatus::Confirmed.respond_reschedule(None, bob, true).is_err());
    }
}
