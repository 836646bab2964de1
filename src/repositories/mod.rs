pub mod barter_repository;
pub mod item_repository;
pub mod message_repository;
pub mod poll_repository;
pub mod session_repository;
pub mod skill_repository;
pub mod token_repository;
pub mod tracking_repository;
pub mod user_repository;

// Re-export all repositories for convenient access
pub use barter_repository::BarterRepository;
pub use item_repository::ItemRepository;
pub use message_repository::MessageRepository;
pub use poll_repository::PollRepository;
pub use session_repository::SessionRepository;
pub use skill_repository::SkillRepository;
pub use token_repository::TokenRepository;
pub use tracking_repository::TrackingRepository;
pub use user_repository::UserRepository;
