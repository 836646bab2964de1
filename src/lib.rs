//! Barter Backend Library
//!
//! Peer-to-peer bartering marketplace: skill and item exchanges driven
//! through request, accept and track workflows, community polls, and a
//! chat channel per request. This module exposes the backend components
//! for use by the binary, tests and API consumers.

pub mod auth;
pub mod chat;
pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod http;
pub mod models;
pub mod repositories;
pub mod services;
pub mod workflow;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use database::Database;
use repositories::*;
use services::*;
use std::sync::Arc;

/// Application state containing all repositories and services
pub struct AppState {
    pub config: AppConfig,
    pub database: Database,
    pub audit: Arc<AuditTrailService>,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub listing_service: Arc<ListingService>,
    pub barter_service: Arc<BarterService>,
    pub tracking_service: Arc<TrackingService>,
    pub session_service: Arc<SessionService>,
    pub poll_service: Arc<PollService>,
    pub message_service: Arc<MessageService>,
}

impl AppState {
    /// Wire repositories and services over one pool
    pub fn new(pool: sqlx::PgPool, config: AppConfig) -> AppResult<Self> {
        let database = Database::new(pool.clone());

        let user_repo = Arc::new(UserRepository::new(pool.clone()));
        let token_repo = Arc::new(TokenRepository::new(pool.clone()));
        let skill_repo = Arc::new(SkillRepository::new(pool.clone()));
        let item_repo = Arc::new(ItemRepository::new(pool.clone()));
        let barter_repo = Arc::new(BarterRepository::new(pool.clone()));
        let tracking_repo = Arc::new(TrackingRepository::new(pool.clone()));
        let session_repo = Arc::new(SessionRepository::new(pool.clone()));
        let poll_repo = Arc::new(PollRepository::new(pool.clone()));
        let message_repo = Arc::new(MessageRepository::new(pool));

        let audit = Arc::new(AuditTrailService::new(&config.audit_log_dir)?);

        Ok(Self {
            auth_service: Arc::new(AuthService::new(
                user_repo.clone(),
                token_repo,
                config.token_ttl(),
                config.points.starting_points,
            )),
            user_service: Arc::new(UserService::new(user_repo.clone())),
            listing_service: Arc::new(ListingService::new(
                skill_repo.clone(),
                item_repo.clone(),
                barter_repo.clone(),
            )),
            barter_service: Arc::new(BarterService::new(
                barter_repo.clone(),
                user_repo,
                skill_repo,
                item_repo.clone(),
                audit.clone(),
            )),
            tracking_service: Arc::new(TrackingService::new(
                tracking_repo,
                barter_repo.clone(),
                item_repo,
                audit.clone(),
            )),
            session_service: Arc::new(SessionService::new(
                session_repo,
                barter_repo.clone(),
                audit.clone(),
            )),
            poll_service: Arc::new(PollService::new(poll_repo, config.points, audit.clone())),
            message_service: Arc::new(MessageService::new(message_repo, barter_repo)),
            audit,
            database,
            config,
        })
    }

    /// Chat server that authenticates against this state's services
    pub fn chat_server(&self) -> chat::ChatServer {
        chat::ChatServer::new(Arc::new(chat::ServiceAuthority::new(
            self.auth_service.clone(),
            self.message_service.clone(),
        )))
    }
}
