//! Domain models for the barter backend.
//!
//! Database-backed rows plus the request/response shapes built from them.

pub mod auth_token;
pub mod barter_request;
pub mod item;
pub mod message;
pub mod poll;
pub mod session;
pub mod skill;
pub mod tracking_record;
pub mod user;

// Re-export all models for convenient access
pub use auth_token::AuthToken;
pub use barter_request::{
    BarterActivity, BarterRequest, BarterRequestLists, NewBarterRequest, RequestDirection,
    StatusUpdate,
};
pub use item::{Item, ItemCondition, ListingFilter, NewItem};
pub use message::{Message, NewMessage};
pub use poll::{NewPoll, Poll, PollView, PollVote, VoteRequest};
pub use session::{NewSession, RescheduleRequest, RescheduleResponse, Session};
pub use skill::{NewSkill, Proficiency, Skill};
pub use tracking_record::{NewTracking, StepUpdate, TrackingRecord, TrackingStepView, TrackingView};
pub use user::{AuthResponse, LoginRequest, ProfileUpdate, PublicProfile, RegisterRequest, User};
