//! Real-time chat between the two parties of a barter request.
//!
//! Connections authenticate with their bearer token during the WebSocket
//! handshake, join rooms keyed by request id and relay `send-message`
//! frames to the other members of the room as `receive-message`.
//! Persistence goes through `POST /messages`; the socket only relays.

pub mod server;

pub use server::ChatServer;

use crate::error::AppResult;
use crate::services::{AuthService, MessageService};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Frames exchanged over the chat socket, tagged by `type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ChatFrame {
    // client -> server
    JoinChat {
        request_id: Uuid,
    },
    LeaveChat {
        request_id: Uuid,
    },
    SendMessage {
        request_id: Uuid,
        message: String,
        /// Id of the persisted copy, when the client stored it first
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_id: Option<Uuid>,
    },

    // server -> client
    Connected {
        user_id: Uuid,
    },
    Joined {
        request_id: Uuid,
    },
    Left {
        request_id: Uuid,
    },
    ReceiveMessage {
        request_id: Uuid,
        sender_id: Uuid,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_id: Option<Uuid>,
        sent_at: i64,
    },
    Error {
        message: String,
    },
}

impl ChatFrame {
    pub fn error(message: impl Into<String>) -> Self {
        ChatFrame::Error {
            message: message.into(),
        }
    }
}

/// Decides who may connect and which rooms they may enter
#[async_trait]
pub trait ChatAuthority: Send + Sync {
    /// Resolve a bearer token to a user id
    async fn authenticate(&self, token: &str) -> AppResult<Uuid>;

    /// Whether `user_id` is a party to `request_id`
    async fn can_join(&self, user_id: Uuid, request_id: Uuid) -> AppResult<bool>;
}

/// Authority backed by the account and barter tables
pub struct ServiceAuthority {
    auth: Arc<AuthService>,
    messages: Arc<MessageService>,
}

impl ServiceAuthority {
    pub fn new(auth: Arc<AuthService>, messages: Arc<MessageService>) -> Self {
        Self { auth, messages }
    }
}

#[async_trait]
impl ChatAuthority for ServiceAuthority {
    async fn authenticate(&self, token: &str) -> AppResult<Uuid> {
        Ok(self.auth.authenticate(token).await?.id)
    }

    async fn can_join(&self, user_id: Uuid, request_id: Uuid) -> AppResult<bool> {
        self.messages.is_participant(user_id, request_id).await
    }
}
