use crate::error::{AppError, AppResult};
use crate::models::{
    BarterActivity, BarterRequest, BarterRequestLists, NewBarterRequest, RequestDirection,
};
use crate::repositories::{BarterRepository, ItemRepository, SkillRepository, UserRepository};
use crate::services::AuditTrailService;
use crate::workflow::barter_status::{check_user_transition, next_statuses};
use crate::workflow::{BarterKind, BarterStatus, WorkflowError};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const MAX_MESSAGE_LEN: usize = 1000;

/// Barter request lifecycle: creation, listing and user-driven status changes
pub struct BarterService {
    barter_repo: Arc<BarterRepository>,
    user_repo: Arc<UserRepository>,
    skill_repo: Arc<SkillRepository>,
    item_repo: Arc<ItemRepository>,
    audit: Arc<AuditTrailService>,
}

impl BarterService {
    pub fn new(
        barter_repo: Arc<BarterRepository>,
        user_repo: Arc<UserRepository>,
        skill_repo: Arc<SkillRepository>,
        item_repo: Arc<ItemRepository>,
        audit: Arc<AuditTrailService>,
    ) -> Self {
        Self {
            barter_repo,
            user_repo,
            skill_repo,
            item_repo,
            audit,
        }
    }

    /// Open a new request in `pending`
    pub async fn create_request(
        &self,
        from_user_id: Uuid,
        new: &NewBarterRequest,
    ) -> AppResult<BarterRequest> {
        check_request_shape(from_user_id, new)?;

        self.user_repo
            .find_by_id(new.to_user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Recipient not found".to_string()))?;

        match new.request_type {
            BarterKind::Skill => self.check_skills(from_user_id, new).await?,
            BarterKind::Item => self.check_items(from_user_id, new).await?,
        }

        if self
            .barter_repo
            .has_pending_duplicate(from_user_id, new.to_skill_id, new.to_item_id)
            .await?
        {
            return Err(AppError::BusinessLogic(
                "You already have a pending request for this listing".to_string(),
            ));
        }

        let request = self.barter_repo.create(from_user_id, new).await?;
        info!(
            "Barter request {} created: {} -> {} ({})",
            request.id, from_user_id, request.to_user_id, request.request_type
        );
        self.audit.log_request_created(&request).await;
        Ok(request)
    }

    /// A request, visible only to its two parties
    pub async fn get_request(&self, user_id: Uuid, request_id: Uuid) -> AppResult<BarterRequest> {
        let request = self.load(request_id).await?;
        if !request.is_participant(user_id) {
            return Err(WorkflowError::NotParticipant.into());
        }
        Ok(request)
    }

    /// Incoming and outgoing requests; `direction` limits the result to one side
    pub async fn list_requests(
        &self,
        user_id: Uuid,
        direction: Option<RequestDirection>,
    ) -> AppResult<BarterRequestLists> {
        let mut lists = BarterRequestLists::default();
        if direction != Some(RequestDirection::Outgoing) {
            lists.incoming = self.barter_repo.find_incoming(user_id).await?;
        }
        if direction != Some(RequestDirection::Incoming) {
            lists.outgoing = self.barter_repo.find_outgoing(user_id).await?;
        }
        Ok(lists)
    }

    /// Every request the user is part of, most recently changed first
    pub async fn activity(&self, user_id: Uuid) -> AppResult<Vec<BarterActivity>> {
        let requests = self.barter_repo.find_activity(user_id).await?;
        Ok(requests
            .into_iter()
            .filter_map(|request| activity_for(user_id, request))
            .collect())
    }

    /// Apply a transition requested by one of the parties
    pub async fn update_status(
        &self,
        user_id: Uuid,
        request_id: Uuid,
        to: BarterStatus,
    ) -> AppResult<BarterRequest> {
        let request = self.load(request_id).await?;
        let party = request
            .party_of(user_id)
            .ok_or(WorkflowError::NotParticipant)?;
        let from = request.status_enum();

        check_user_transition(request.kind(), from, to, party)?;

        let updated = match (request.kind(), to, request.to_item_id) {
            (BarterKind::Item, BarterStatus::Accepted, Some(item_id)) => {
                self.barter_repo
                    .accept_item_request(request.id, item_id)
                    .await?
            }
            _ => self.barter_repo.update_status(request.id, from, to).await?,
        };

        info!(
            "Barter request {} moved {} -> {} by {}",
            request.id,
            from.as_str(),
            to.as_str(),
            party.as_str()
        );
        self.audit
            .log_status_changed(request.id, Some(user_id), from, to)
            .await;
        Ok(updated)
    }

    async fn load(&self, request_id: Uuid) -> AppResult<BarterRequest> {
        self.barter_repo
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Barter request not found".to_string()))
    }

    async fn check_skills(&self, from_user_id: Uuid, new: &NewBarterRequest) -> AppResult<()> {
        if let Some(to_skill_id) = new.to_skill_id {
            let skill = self
                .skill_repo
                .find_by_id(to_skill_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Requested skill not found".to_string()))?;
            if skill.user_id != new.to_user_id {
                return Err(AppError::Validation(
                    "Requested skill does not belong to the recipient".to_string(),
                ));
            }
            if !skill.is_available {
                return Err(AppError::BusinessLogic(
                    "Requested skill is not available".to_string(),
                ));
            }
        }
        if let Some(from_skill_id) = new.from_skill_id {
            let skill = self
                .skill_repo
                .find_by_id(from_skill_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Offered skill not found".to_string()))?;
            if skill.user_id != from_user_id {
                return Err(AppError::Validation(
                    "You can only offer your own skills".to_string(),
                ));
            }
        }
        Ok(())
    }

    async fn check_items(&self, from_user_id: Uuid, new: &NewBarterRequest) -> AppResult<()> {
        if let Some(to_item_id) = new.to_item_id {
            let item = self
                .item_repo
                .find_by_id(to_item_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Requested item not found".to_string()))?;
            if item.user_id != new.to_user_id {
                return Err(AppError::Validation(
                    "Requested item does not belong to the recipient".to_string(),
                ));
            }
            if !item.is_available {
                return Err(AppError::BusinessLogic(
                    "Requested item is not available".to_string(),
                ));
            }
        }
        if let Some(from_item_id) = new.from_item_id {
            let item = self
                .item_repo
                .find_by_id(from_item_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Offered item not found".to_string()))?;
            if item.user_id != from_user_id {
                return Err(AppError::Validation(
                    "You can only offer your own items".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Field checks that need no database access
pub fn check_request_shape(from_user_id: Uuid, new: &NewBarterRequest) -> AppResult<()> {
    if from_user_id == new.to_user_id {
        return Err(AppError::Validation(
            "You cannot send a barter request to yourself".to_string(),
        ));
    }

    match new.request_type {
        BarterKind::Skill => {
            if new.to_skill_id.is_none() {
                return Err(AppError::Validation(
                    "A skill request needs the requested skill".to_string(),
                ));
            }
            if new.from_item_id.is_some() || new.to_item_id.is_some() {
                return Err(AppError::Validation(
                    "A skill request cannot reference items".to_string(),
                ));
            }
        }
        BarterKind::Item => {
            if new.to_item_id.is_none() {
                return Err(AppError::Validation(
                    "An item request needs the requested item".to_string(),
                ));
            }
            if new.from_skill_id.is_some() || new.to_skill_id.is_some() {
                return Err(AppError::Validation(
                    "An item request cannot reference skills".to_string(),
                ));
            }
        }
    }

    if new
        .message
        .as_deref()
        .is_some_and(|m| m.chars().count() > MAX_MESSAGE_LEN)
    {
        return Err(AppError::Validation(format!(
            "Message must be at most {} characters",
            MAX_MESSAGE_LEN
        )));
    }

    Ok(())
}

/// The caller's view of one request, `None` if they are not a party
pub fn activity_for(user_id: Uuid, request: BarterRequest) -> Option<BarterActivity> {
    let role = request.party_of(user_id)?;
    let counterparty_id = request.counterparty(user_id)?;
    let kind = request.kind();
    let from = request.status_enum();
    let available_statuses = next_statuses(kind, from)
        .into_iter()
        .filter(|to| check_user_transition(kind, from, *to, role).is_ok())
        .collect();

    Some(BarterActivity {
        request,
        role,
        counterparty_id,
        available_statuses,
    })
}
