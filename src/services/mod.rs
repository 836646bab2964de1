pub mod audit;
pub mod auth_service;
pub mod barter_service;
pub mod listing_service;
pub mod message_service;
pub mod poll_service;
pub mod session_service;
pub mod tracking_service;
pub mod user_service;

pub use audit::AuditTrailService;
pub use auth_service::AuthService;
pub use barter_service::BarterService;
pub use listing_service::ListingService;
pub use message_service::MessageService;
pub use poll_service::PollService;
pub use session_service::SessionService;
pub use tracking_service::TrackingService;
pub use user_service::UserService;
