use crate::error::{AppError, AppResult};
use crate::models::{BarterRequest, NewSession, RescheduleRequest, Session};
use crate::repositories::{BarterRepository, SessionRepository};
use crate::services::AuditTrailService;
use crate::workflow::{BarterKind, BarterStatus, SessionStatus, WorkflowError};
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Allowed session length in minutes
pub const SESSION_DURATION_MINUTES: RangeInclusive<i32> = 15..=480;

const MAX_NOTES_LEN: usize = 1000;

/// Scheduling of skill exchange sessions
pub struct SessionService {
    session_repo: Arc<SessionRepository>,
    barter_repo: Arc<BarterRepository>,
    audit: Arc<AuditTrailService>,
}

impl SessionService {
    pub fn new(
        session_repo: Arc<SessionRepository>,
        barter_repo: Arc<BarterRepository>,
        audit: Arc<AuditTrailService>,
    ) -> Self {
        Self {
            session_repo,
            barter_repo,
            audit,
        }
    }

    /// Schedule a session under an accepted or ongoing skill exchange
    pub async fn create(&self, user_id: Uuid, new: &NewSession) -> AppResult<Session> {
        validate_new_session(new)?;

        let request = self.load_request(user_id, new.barter_request_id).await?;
        if request.kind() != BarterKind::Skill {
            return Err(WorkflowError::WrongKind { expected: "skill" }.into());
        }
        if !matches!(
            request.status_enum(),
            BarterStatus::Accepted | BarterStatus::Ongoing
        ) {
            return Err(AppError::BusinessLogic(format!(
                "Sessions can only be scheduled for accepted exchanges (currently {})",
                request.status
            )));
        }

        let session = self.session_repo.create(user_id, new).await?;
        info!(
            "Session {} scheduled for request {} at {}",
            session.id,
            request.id,
            session.starts_at()
        );
        self.audit
            .log_session_changed(&session, user_id, "created")
            .await;
        Ok(session)
    }

    pub async fn list_for_request(&self, user_id: Uuid, request_id: Uuid) -> AppResult<Vec<Session>> {
        let request = self.load_request(user_id, request_id).await?;
        Ok(self.session_repo.find_by_request(request.id).await?)
    }

    /// Confirmation by the party that did not create the session.
    /// The first confirmation moves an accepted request to ongoing.
    pub async fn confirm(&self, user_id: Uuid, session_id: Uuid) -> AppResult<Session> {
        let (session, request) = self.load(user_id, session_id).await?;
        let current = session.status_enum();
        let next = current.confirm(session.created_by == user_id)?;

        let request_change = (request.status_enum() == BarterStatus::Accepted)
            .then_some((request.id, BarterStatus::Accepted, BarterStatus::Ongoing));

        let (session, moved) = self
            .session_repo
            .update_status(session.id, current, next, request_change)
            .await?;

        if moved.is_some() {
            info!("Request {} is now ongoing", request.id);
            self.audit
                .log_status_changed(
                    request.id,
                    Some(user_id),
                    BarterStatus::Accepted,
                    BarterStatus::Ongoing,
                )
                .await;
        }
        self.audit
            .log_session_changed(&session, user_id, "confirmed")
            .await;
        Ok(session)
    }

    pub async fn cancel(&self, user_id: Uuid, session_id: Uuid) -> AppResult<Session> {
        let (session, _) = self.load(user_id, session_id).await?;
        let current = session.status_enum();
        let next = current.cancel()?;
        let (session, _) = self
            .session_repo
            .update_status(session.id, current, next, None)
            .await?;
        self.audit
            .log_session_changed(&session, user_id, "cancelled")
            .await;
        Ok(session)
    }

    pub async fn complete(&self, user_id: Uuid, session_id: Uuid) -> AppResult<Session> {
        let (session, _) = self.load(user_id, session_id).await?;
        let current = session.status_enum();
        let next = current.complete()?;
        let (session, _) = self
            .session_repo
            .update_status(session.id, current, next, None)
            .await?;
        self.audit
            .log_session_changed(&session, user_id, "completed")
            .await;
        Ok(session)
    }

    /// Propose a new date and time
    pub async fn request_reschedule(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        proposal: &RescheduleRequest,
    ) -> AppResult<Session> {
        let (session, _) = self.load(user_id, session_id).await?;
        session
            .status_enum()
            .check_reschedule_request(session.reschedule_requested_by)?;

        let session = self
            .session_repo
            .request_reschedule(session.id, user_id, proposal)
            .await?;
        self.audit
            .log_session_changed(&session, user_id, "reschedule_requested")
            .await;
        Ok(session)
    }

    /// Accept or decline the pending proposal
    pub async fn respond_reschedule(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        accept: bool,
    ) -> AppResult<Session> {
        let (session, _) = self.load(user_id, session_id).await?;
        let next = session.status_enum().respond_reschedule(
            session.reschedule_requested_by,
            user_id,
            accept,
        )?;

        let session = self
            .session_repo
            .resolve_reschedule(session.id, accept, next)
            .await?;
        let action = if accept {
            "reschedule_accepted"
        } else {
            "reschedule_declined"
        };
        self.audit.log_session_changed(&session, user_id, action).await;
        Ok(session)
    }

    async fn load(&self, user_id: Uuid, session_id: Uuid) -> AppResult<(Session, BarterRequest)> {
        let session = self
            .session_repo
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;
        let request = self.load_request(user_id, session.barter_request_id).await?;
        Ok((session, request))
    }

    async fn load_request(&self, user_id: Uuid, request_id: Uuid) -> AppResult<BarterRequest> {
        let request = self
            .barter_repo
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Barter request not found".to_string()))?;
        if !request.is_participant(user_id) {
            return Err(WorkflowError::NotParticipant.into());
        }
        Ok(request)
    }
}

pub fn validate_new_session(new: &NewSession) -> AppResult<()> {
    if !SESSION_DURATION_MINUTES.contains(&new.duration_minutes) {
        return Err(AppError::Validation(format!(
            "Duration must be between {} and {} minutes",
            SESSION_DURATION_MINUTES.start(),
            SESSION_DURATION_MINUTES.end()
        )));
    }
    if new
        .notes
        .as_deref()
        .is_some_and(|n| n.chars().count() > MAX_NOTES_LEN)
    {
        return Err(AppError::Validation(format!(
            "Notes must be at most {} characters",
            MAX_NOTES_LEN
        )));
    }
    Ok(())
}
