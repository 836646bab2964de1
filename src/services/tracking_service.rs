use crate::error::{AppError, AppResult, RepositoryError};
use crate::models::{BarterRequest, TrackingRecord, TrackingView};
use crate::repositories::{BarterRepository, ItemRepository, TrackingRepository};
use crate::services::AuditTrailService;
use crate::workflow::barter_status::check_tracking_transition;
use crate::workflow::{BarterKind, BarterStatus, Party, TrackingStep, WorkflowError};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Item exchange tracking checklist
pub struct TrackingService {
    tracking_repo: Arc<TrackingRepository>,
    barter_repo: Arc<BarterRepository>,
    item_repo: Arc<ItemRepository>,
    audit: Arc<AuditTrailService>,
}

impl TrackingService {
    pub fn new(
        tracking_repo: Arc<TrackingRepository>,
        barter_repo: Arc<BarterRepository>,
        item_repo: Arc<ItemRepository>,
        audit: Arc<AuditTrailService>,
    ) -> Self {
        Self {
            tracking_repo,
            barter_repo,
            item_repo,
            audit,
        }
    }

    /// Start tracking an accepted item exchange; all steps start open
    pub async fn create(&self, user_id: Uuid, request_id: Uuid) -> AppResult<TrackingView> {
        let (request, party) = self.load_request(user_id, request_id).await?;

        if request.kind() != BarterKind::Item {
            return Err(WorkflowError::WrongKind { expected: "item" }.into());
        }
        if request.status_enum() != BarterStatus::Accepted {
            return Err(AppError::BusinessLogic(format!(
                "Tracking starts once the request is accepted (currently {})",
                request.status
            )));
        }

        let record = self
            .tracking_repo
            .create(request.id)
            .await
            .map_err(|e| match e {
                RepositoryError::Duplicate(_) => AppError::BusinessLogic(
                    "Tracking already exists for this request".to_string(),
                ),
                other => other.into(),
            })?;

        info!("Tracking {} started for request {}", record.id, request.id);
        Ok(TrackingView::for_party(record, party))
    }

    /// The checklist of a request, with the caller's permissions
    pub async fn get_for_request(&self, user_id: Uuid, request_id: Uuid) -> AppResult<TrackingView> {
        let (request, party) = self.load_request(user_id, request_id).await?;
        let record = self
            .tracking_repo
            .find_by_request(request.id)
            .await?
            .ok_or_else(|| AppError::NotFound("No tracking for this request".to_string()))?;
        Ok(TrackingView::for_party(record, party))
    }

    /// Complete one step as the calling user
    pub async fn complete_step(
        &self,
        user_id: Uuid,
        tracking_id: Uuid,
        step: TrackingStep,
    ) -> AppResult<TrackingView> {
        let record = self.load_record(tracking_id).await?;
        let (request, party) = self.load_request(user_id, record.barter_request_id).await?;

        record.checklist().check_update(step, party)?;

        let status_change = match step.status_effect() {
            Some((from, to)) => {
                check_tracking_transition(request.kind(), from, to)?;
                let current = request.status_enum();
                if current != from {
                    return Err(WorkflowError::InvalidTransition {
                        from: current.as_str().to_string(),
                        to: to.as_str().to_string(),
                    }
                    .into());
                }
                Some((from, to))
            }
            None => None,
        };

        let (record, moved) = self
            .tracking_repo
            .complete_step(&record, step, status_change)
            .await?;

        info!(
            "Tracking {} step {} completed by {}",
            record.id,
            step.as_str(),
            party.as_str()
        );
        self.audit
            .log_tracking_step(request.id, user_id, step)
            .await;

        if let (Some((from, to)), Some(moved)) = (status_change, moved) {
            self.audit
                .log_status_changed(moved.id, None, from, to)
                .await;
            if to == BarterStatus::Completed {
                if let Some(item_id) = moved.to_item_id {
                    self.item_repo.set_available(item_id, true).await?;
                }
            }
        }

        Ok(TrackingView::for_party(record, party))
    }

    async fn load_record(&self, tracking_id: Uuid) -> AppResult<TrackingRecord> {
        self.tracking_repo
            .find_by_id(tracking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Tracking record not found".to_string()))
    }

    async fn load_request(
        &self,
        user_id: Uuid,
        request_id: Uuid,
    ) -> AppResult<(BarterRequest, Party)> {
        let request = self
            .barter_repo
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Barter request not found".to_string()))?;
        let party = request
            .party_of(user_id)
            .ok_or(WorkflowError::NotParticipant)?;
        Ok((request, party))
    }
}
