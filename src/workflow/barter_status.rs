use super::{WorkflowError, WorkflowResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What is being exchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarterKind {
    Skill,
    Item,
}

impl BarterKind {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "skill" => Ok(BarterKind::Skill),
            "item" => Ok(BarterKind::Item),
            _ => Err(format!("Invalid request type: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            BarterKind::Skill => "skill",
            BarterKind::Item => "item",
        }
    }
}

/// Barter request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarterStatus {
    Pending,
    Accepted,
    Declined,
    Cancelled,
    Shipped,
    Ongoing,
    Completed,
}

impl BarterStatus {
    pub const ALL: [BarterStatus; 7] = [
        BarterStatus::Pending,
        BarterStatus::Accepted,
        BarterStatus::Declined,
        BarterStatus::Cancelled,
        BarterStatus::Shipped,
        BarterStatus::Ongoing,
        BarterStatus::Completed,
    ];

    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(BarterStatus::Pending),
            "accepted" => Ok(BarterStatus::Accepted),
            "declined" => Ok(BarterStatus::Declined),
            "cancelled" => Ok(BarterStatus::Cancelled),
            "shipped" => Ok(BarterStatus::Shipped),
            "ongoing" => Ok(BarterStatus::Ongoing),
            "completed" => Ok(BarterStatus::Completed),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            BarterStatus::Pending => "pending",
            BarterStatus::Accepted => "accepted",
            BarterStatus::Declined => "declined",
            BarterStatus::Cancelled => "cancelled",
            BarterStatus::Shipped => "shipped",
            BarterStatus::Ongoing => "ongoing",
            BarterStatus::Completed => "completed",
        }
    }

    /// No transition leaves a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BarterStatus::Declined | BarterStatus::Cancelled | BarterStatus::Completed
        )
    }
}

impl From<BarterStatus> for String {
    fn from(status: BarterStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Which side of a request a user is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    /// `from_user`: sent the request. In item exchanges, the borrower.
    Requester,
    /// `to_user`: received the request. In item exchanges, the owner.
    Recipient,
}

impl Party {
    /// Resolve a user's side of a request, `None` for outsiders
    pub fn of(user_id: Uuid, from_user_id: Uuid, to_user_id: Uuid) -> Option<Party> {
        if user_id == from_user_id {
            Some(Party::Requester)
        } else if user_id == to_user_id {
            Some(Party::Recipient)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Party::Requester => "requester",
            Party::Recipient => "recipient",
        }
    }
}

/// Who may trigger a given edge of the status graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDriver {
    Requester,
    Recipient,
    EitherParty,
    /// Item exchanges advance only through the tracking checklist
    Tracking,
}

impl TransitionDriver {
    pub fn allows(&self, party: Party) -> bool {
        match self {
            TransitionDriver::Requester => party == Party::Requester,
            TransitionDriver::Recipient => party == Party::Recipient,
            TransitionDriver::EitherParty => true,
            TransitionDriver::Tracking => false,
        }
    }
}

/// The edge `from -> to` for an exchange of `kind`, or `None` if the graph has no such edge
pub fn transition_driver(
    kind: BarterKind,
    from: BarterStatus,
    to: BarterStatus,
) -> Option<TransitionDriver> {
    use BarterKind::*;
    use BarterStatus::*;

    match (kind, from, to) {
        (_, Pending, Accepted) | (_, Pending, Declined) => Some(TransitionDriver::Recipient),
        (_, Pending, Cancelled) => Some(TransitionDriver::Requester),
        (Item, Accepted, Shipped) | (Item, Shipped, Ongoing) | (Item, Ongoing, Completed) => {
            Some(TransitionDriver::Tracking)
        }
        (Skill, Accepted, Ongoing) | (Skill, Ongoing, Completed) => {
            Some(TransitionDriver::EitherParty)
        }
        _ => None,
    }
}

/// Statuses reachable from `from` in one step
pub fn next_statuses(kind: BarterKind, from: BarterStatus) -> Vec<BarterStatus> {
    BarterStatus::ALL
        .into_iter()
        .filter(|to| transition_driver(kind, from, *to).is_some())
        .collect()
}

/// Check a transition requested directly by one of the parties
pub fn check_user_transition(
    kind: BarterKind,
    from: BarterStatus,
    to: BarterStatus,
    party: Party,
) -> WorkflowResult<()> {
    let driver = transition_driver(kind, from, to).ok_or_else(|| invalid(from, to))?;

    if driver == TransitionDriver::Tracking {
        return Err(WorkflowError::NotPermitted(format!(
            "item exchanges move to {} through the tracking checklist",
            to.as_str()
        )));
    }

    if driver.allows(party) {
        return Ok(());
    }

    let who = match driver {
        TransitionDriver::Recipient => "recipient",
        _ => "requester",
    };
    Err(WorkflowError::NotPermitted(format!(
        "only the {} can mark this request {}",
        who,
        to.as_str()
    )))
}

/// Check a transition caused by a tracking checklist step
pub fn check_tracking_transition(
    kind: BarterKind,
    from: BarterStatus,
    to: BarterStatus,
) -> WorkflowResult<()> {
    match transition_driver(kind, from, to) {
        Some(TransitionDriver::Tracking) => Ok(()),
        _ => Err(invalid(from, to)),
    }
}

fn invalid(from: BarterStatus, to: BarterStatus) -> WorkflowError {
    WorkflowError::InvalidTransition {
        from: from.as_str().to_string(),
        to: to.as_str().to_string(),
    }
}
