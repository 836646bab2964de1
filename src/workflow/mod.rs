//! Exchange workflow state machines.
//!
//! Pure, I/O-free rules for the barter request lifecycle, the item
//! tracking checklist and skill session scheduling. Services load the
//! current state from the database, ask these types whether a move is
//! legal, and persist the result.

pub mod barter_status;
pub mod session_status;
pub mod tracking;

pub use barter_status::{BarterKind, BarterStatus, Party, TransitionDriver};
pub use session_status::SessionStatus;
pub use tracking::{TrackingChecklist, TrackingStep};

use thiserror::Error;

/// Errors raised when a workflow rule rejects a move
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Not permitted: {0}")]
    NotPermitted(String),

    #[error("User is not a party to this exchange")]
    NotParticipant,

    #[error("Step {0} requires the previous step to be completed first")]
    StepLocked(&'static str),

    #[error("Step {0} is already completed")]
    StepAlreadyCompleted(&'static str),

    #[error("Operation requires a {expected} exchange")]
    WrongKind { expected: &'static str },
}

/// Result type for workflow checks
pub type WorkflowResult<T> = Result<T, WorkflowError>;
