use crate::workflow::{Party, TrackingChecklist, TrackingStep};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Shipment progress of an item exchange
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrackingRecord {
    pub id: Uuid,
    pub barter_request_id: Uuid,
    pub item_packed: bool,
    pub item_packed_at: Option<NaiveDateTime>,
    pub package_sent: bool,
    pub package_sent_at: Option<NaiveDateTime>,
    pub package_delivered: bool,
    pub package_delivered_at: Option<NaiveDateTime>,
    pub exchange_started: bool,
    pub exchange_started_at: Option<NaiveDateTime>,
    pub return_packed: bool,
    pub return_packed_at: Option<NaiveDateTime>,
    pub return_sent: bool,
    pub return_sent_at: Option<NaiveDateTime>,
    pub return_delivered: bool,
    pub return_delivered_at: Option<NaiveDateTime>,
    pub exchange_completed: bool,
    pub exchange_completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TrackingRecord {
    /// Flags in checklist order
    pub fn checklist(&self) -> TrackingChecklist {
        TrackingChecklist::from_flags([
            self.item_packed,
            self.package_sent,
            self.package_delivered,
            self.exchange_started,
            self.return_packed,
            self.return_sent,
            self.return_delivered,
            self.exchange_completed,
        ])
    }

    pub fn completed_at(&self, step: TrackingStep) -> Option<NaiveDateTime> {
        match step {
            TrackingStep::ItemPacked => self.item_packed_at,
            TrackingStep::PackageSent => self.package_sent_at,
            TrackingStep::PackageDelivered => self.package_delivered_at,
            TrackingStep::ExchangeStarted => self.exchange_started_at,
            TrackingStep::ReturnPacked => self.return_packed_at,
            TrackingStep::ReturnSent => self.return_sent_at,
            TrackingStep::ReturnDelivered => self.return_delivered_at,
            TrackingStep::ExchangeCompleted => self.exchange_completed_at,
        }
    }
}

/// One checklist line as shown to a particular user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingStepView {
    pub step: TrackingStep,
    pub actor: Party,
    pub completed: bool,
    pub completed_at: Option<NaiveDateTime>,
    pub can_update: bool,
}

/// Tracking record with per-step permissions for the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingView {
    pub record: TrackingRecord,
    pub steps: Vec<TrackingStepView>,
    pub next_step: Option<TrackingStep>,
}

impl TrackingView {
    pub fn for_party(record: TrackingRecord, party: Party) -> Self {
        let checklist = record.checklist();
        let steps = TrackingStep::ALL
            .into_iter()
            .map(|step| TrackingStepView {
                step,
                actor: step.actor(),
                completed: checklist.is_completed(step),
                completed_at: record.completed_at(step),
                can_update: checklist.can_update(step, party),
            })
            .collect();

        Self {
            next_step: checklist.next_step(),
            record,
            steps,
        }
    }
}

/// Body of `POST /tracking`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTracking {
    pub barter_request_id: Uuid,
}

/// Body of `PUT /tracking/:id/step`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepUpdate {
    pub step: TrackingStep,
}
