//! Item exchange tracking checklist.
//!
//! An item exchange is tracked through eight ordered steps. The owner (the
//! recipient of the request, whose item was asked for) ships the item, the
//! borrower (the requester) confirms delivery, uses it for the barter
//! period and sends it back, and the owner closes the exchange.
//!
//! A step can be completed only when the step before it is completed, only
//! once, and only by its actor. Three steps also move the parent request:
//! `package_sent` ships it, `exchange_started` makes it ongoing and
//! `exchange_completed` completes it.

use super::{BarterStatus, Party, WorkflowError, WorkflowResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStep {
    ItemPacked,
    PackageSent,
    PackageDelivered,
    ExchangeStarted,
    ReturnPacked,
    ReturnSent,
    ReturnDelivered,
    ExchangeCompleted,
}

impl TrackingStep {
    pub const ALL: [TrackingStep; 8] = [
        TrackingStep::ItemPacked,
        TrackingStep::PackageSent,
        TrackingStep::PackageDelivered,
        TrackingStep::ExchangeStarted,
        TrackingStep::ReturnPacked,
        TrackingStep::ReturnSent,
        TrackingStep::ReturnDelivered,
        TrackingStep::ExchangeCompleted,
    ];

    /// Zero-based position in the checklist
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Convert from the flag column name
    pub fn from_str(s: &str) -> Result<Self, String> {
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("Invalid tracking step: {}", s))
    }

    /// Flag column name; the timestamp column is `<name>_at`
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingStep::ItemPacked => "item_packed",
            TrackingStep::PackageSent => "package_sent",
            TrackingStep::PackageDelivered => "package_delivered",
            TrackingStep::ExchangeStarted => "exchange_started",
            TrackingStep::ReturnPacked => "return_packed",
            TrackingStep::ReturnSent => "return_sent",
            TrackingStep::ReturnDelivered => "return_delivered",
            TrackingStep::ExchangeCompleted => "exchange_completed",
        }
    }

    /// Party allowed to complete this step
    pub fn actor(&self) -> Party {
        match self {
            TrackingStep::ItemPacked
            | TrackingStep::PackageSent
            | TrackingStep::ReturnDelivered
            | TrackingStep::ExchangeCompleted => Party::Recipient,
            TrackingStep::PackageDelivered
            | TrackingStep::ExchangeStarted
            | TrackingStep::ReturnPacked
            | TrackingStep::ReturnSent => Party::Requester,
        }
    }

    pub fn previous(&self) -> Option<TrackingStep> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn next(&self) -> Option<TrackingStep> {
        Self::from_index(self.index() + 1)
    }

    /// Request status transition caused by completing this step, as `(from, to)`
    pub fn status_effect(&self) -> Option<(BarterStatus, BarterStatus)> {
        match self {
            TrackingStep::PackageSent => Some((BarterStatus::Accepted, BarterStatus::Shipped)),
            TrackingStep::ExchangeStarted => Some((BarterStatus::Shipped, BarterStatus::Ongoing)),
            TrackingStep::ExchangeCompleted => {
                Some((BarterStatus::Ongoing, BarterStatus::Completed))
            }
            _ => None,
        }
    }
}

/// Completion flags of the eight steps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingChecklist {
    completed: [bool; 8],
}

impl TrackingChecklist {
    /// A fresh checklist with nothing completed
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_flags(completed: [bool; 8]) -> Self {
        Self { completed }
    }

    pub fn flags(&self) -> [bool; 8] {
        self.completed
    }

    pub fn is_completed(&self, step: TrackingStep) -> bool {
        self.completed[step.index()]
    }

    fn previous_completed(&self, step: TrackingStep) -> bool {
        step.previous().map_or(true, |prev| self.is_completed(prev))
    }

    /// Previous step done, this step open, and `party` is its actor
    pub fn can_update(&self, step: TrackingStep, party: Party) -> bool {
        self.check_update(step, party).is_ok()
    }

    pub fn check_update(&self, step: TrackingStep, party: Party) -> WorkflowResult<()> {
        if self.is_completed(step) {
            return Err(WorkflowError::StepAlreadyCompleted(step.as_str()));
        }
        if !self.previous_completed(step) {
            return Err(WorkflowError::StepLocked(step.as_str()));
        }
        if step.actor() != party {
            return Err(WorkflowError::NotPermitted(format!(
                "{} must be marked by the {}",
                step.as_str(),
                match step.actor() {
                    Party::Recipient => "item owner",
                    Party::Requester => "borrower",
                }
            )));
        }
        Ok(())
    }

    /// Mark `step` completed after checking the gate
    pub fn complete(&mut self, step: TrackingStep, party: Party) -> WorkflowResult<()> {
        self.check_update(step, party)?;
        self.completed[step.index()] = true;
        Ok(())
    }

    /// First open step, `None` once the exchange is closed
    pub fn next_step(&self) -> Option<TrackingStep> {
        TrackingStep::ALL
            .into_iter()
            .find(|step| !self.is_completed(*step))
    }

    /// Steps `party` could mark right now (at most one)
    pub fn available_steps(&self, party: Party) -> Vec<TrackingStep> {
        TrackingStep::ALL
            .into_iter()
            .filter(|step| self.can_update(*step, party))
            .collect()
    }

    pub fn completed_count(&self) -> usize {
        self.completed.iter().filter(|done| **done).count()
    }

    pub fn is_finished(&self) -> bool {
        self.completed.iter().all(|done| *done)
    }

    /// Completed steps form a prefix of the checklist
    pub fn is_consistent(&self) -> bool {
        self.completed.windows(2).all(|pair| pair[0] || !pair[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_checklist_only_offers_packing_to_owner() {
        let checklist = TrackingChecklist::new();
        assert_eq!(checklist.next_step(), Some(TrackingStep::ItemPacked));
        assert_eq!(checklist.available_steps(Party::Recipient), vec![TrackingStep::ItemPacked]);
        assert!(checklist.available_steps(Party::Requester).is_empty());
    }

    #[test]
    fn test_step_requires_previous() {
        let checklist = TrackingChecklist::new();
        assert_eq!(
            checklist.check_update(TrackingStep::PackageSent, Party::Recipient),
            Err(WorkflowError::StepLocked("package_sent"))
        );
    }

    #[test]
    fn test_completed_step_is_immutable() {
        let mut checklist = TrackingChecklist::new();
        checklist.complete(TrackingStep::ItemPacked, Party::Recipient).unwrap();
        assert_eq!(
            checklist.complete(TrackingStep::ItemPacked, Party::Recipient),
            Err(WorkflowError::StepAlreadyCompleted("item_packed"))
        );
        assert!(checklist.can_update(TrackingStep::PackageSent, Party::Recipient));
    }

    #[test]
    fn test_wrong_actor_is_rejected() {
        let mut checklist = TrackingChecklist::new();
        let result = checklist.complete(TrackingStep::ItemPacked, Party::Requester);
        assert!(matches!(result, Err(WorkflowError::NotPermitted(_))));
        assert!(!checklist.is_completed(TrackingStep::ItemPacked));
    }

    #[test]
    fn test_full_run_alternates_actors() {
        let mut checklist = TrackingChecklist::new();
        for step in TrackingStep::ALL {
            checklist.complete(step, step.actor()).unwrap();
            assert!(checklist.is_consistent());
        }
        assert!(checklist.is_finished());
        assert_eq!(checklist.next_step(), None);
        assert_eq!(checklist.completed_count(), 8);
    }

    #[test]
    fn test_consistency_detects_gaps() {
        let mut flags = [false; 8];
        flags[2] = true;
        assert!(!TrackingChecklist::from_flags(flags).is_consistent());
        assert!(TrackingChecklist::from_flags([true, true, false, false, false, false, false, false]).is_consistent());
    }

    #[test]
    fn test_step_names_and_neighbours() {
        assert_eq!(TrackingStep::from_str("return_sent"), Ok(TrackingStep::ReturnSent));
        assert!(TrackingStep::from_str("teleported").is_err());
        assert_eq!(TrackingStep::ItemPacked.previous(), None);
        assert_eq!(TrackingStep::ExchangeCompleted.next(), None);
        assert_eq!(TrackingStep::ReturnPacked.previous(), Some(TrackingStep::ExchangeStarted));
    }

    #[test]
    fn test_status_effects_follow_the_graph() {
        let effects: Vec<_> = TrackingStep::ALL
            .into_iter()
            .filter_map(|step| step.status_effect())
            .collect();
        assert_eq!(
            effects,
            vec![
                (BarterStatus::Accepted, BarterStatus::Shipped),
                (BarterStatus::Shipped, BarterStatus::Ongoing),
                (BarterStatus::Ongoing, BarterStatus::Completed),
            ]
        );
    }
}
