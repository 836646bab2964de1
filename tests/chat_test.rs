//! Chat relay over real sockets with an in-memory authority.

use async_trait::async_trait;
use barter_backend::chat::{ChatAuthority, ChatFrame, ChatServer};
use barter_backend::client::{ChatClient, ClientError};
use barter_backend::error::{AppError, AppResult};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;
use uuid::Uuid;

/// Tokens and request participants held in memory
struct StaticAuthority {
    tokens: HashMap<String, Uuid>,
    participants: HashSet<(Uuid, Uuid)>,
}

#[async_trait]
impl ChatAuthority for StaticAuthority {
    async fn authenticate(&self, token: &str) -> AppResult<Uuid> {
        self.tokens
            .get(token)
            .copied()
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))
    }

    async fn can_join(&self, user_id: Uuid, request_id: Uuid) -> AppResult<bool> {
        Ok(self.participants.contains(&(user_id, request_id)))
    }
}

struct ChatFixture {
    server: ChatServer,
    url: String,
    request_id: Uuid,
    alice: Uuid,
    bob: Uuid,
}

async fn start_chat() -> ChatFixture {
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let mallory = Uuid::new_v4();
    let request_id = Uuid::new_v4();

    let authority = StaticAuthority {
        tokens: HashMap::from([
            ("alice-token".to_string(), alice),
            ("bob-token".to_string(), bob),
            ("mallory-token".to_string(), mallory),
        ]),
        participants: HashSet::from([(alice, request_id), (bob, request_id)]),
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = ChatServer::new(Arc::new(authority));
    let serving = server.clone();
    tokio::spawn(async move { serving.serve(listener).await });

    ChatFixture {
        server,
        url: format!("ws://{}", addr),
        request_id,
        alice,
        bob,
    }
}

async fn next(client: &mut ChatClient) -> ChatFrame {
    timeout(Duration::from_secs(5), client.next_frame())
        .await
        .expect("timed out waiting for a frame")
        .expect("chat frame")
}

#[tokio::test]
async fn test_message_is_relayed_to_the_other_party() {
    let fixture = start_chat().await;

    let mut alice = ChatClient::connect(&fixture.url, "alice-token").await.unwrap();
    let mut bob = ChatClient::connect(&fixture.url, "bob-token").await.unwrap();
    assert_eq!(alice.user_id(), fixture.alice);
    assert_eq!(bob.user_id(), fixture.bob);

    alice.join(fixture.request_id).await.unwrap();
    bob.join(fixture.request_id).await.unwrap();
    assert_eq!(fixture.server.room_size(fixture.request_id).await, 2);

    alice
        .send_message(fixture.request_id, "  Does Saturday work?  ", None)
        .await
        .unwrap();

    match next(&mut bob).await {
        ChatFrame::ReceiveMessage {
            request_id,
            sender_id,
            message,
            message_id,
            ..
        } => {
            assert_eq!(request_id, fixture.request_id);
            assert_eq!(sender_id, fixture.alice);
            assert_eq!(message, "Does Saturday work?");
            assert_eq!(message_id, None);
        }
        other => panic!("unexpected frame {:?}", other),
    }

    // the sender gets no echo; the next thing alice sees is bob's reply
    let stored = Uuid::new_v4();
    bob.send_message(fixture.request_id, "Saturday is fine", Some(stored))
        .await
        .unwrap();
    match next(&mut alice).await {
        ChatFrame::ReceiveMessage {
            sender_id,
            message_id,
            ..
        } => {
            assert_eq!(sender_id, fixture.bob);
            assert_eq!(message_id, Some(stored));
        }
        other => panic!("unexpected frame {:?}", other),
    }

    // leaving stops delivery to that connection
    bob.leave(fixture.request_id).await.unwrap();
    assert!(matches!(next(&mut bob).await, ChatFrame::Left { .. }));
    assert_eq!(fixture.server.room_size(fixture.request_id).await, 1);

    alice.close().await.unwrap();
    bob.close().await.unwrap();
}

#[tokio::test]
async fn test_outsider_cannot_join() {
    let fixture = start_chat().await;

    let mut mallory = ChatClient::connect(&fixture.url, "mallory-token").await.unwrap();
    let err = mallory.join(fixture.request_id).await.unwrap_err();
    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn test_bad_token_is_refused() {
    let fixture = start_chat().await;

    match ChatClient::connect(&fixture.url, "stolen-token").await {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid or expired token");
        }
        Err(other) => panic!("unexpected error {:?}", other),
        Ok(_) => panic!("connection should have been refused"),
    }
}

#[tokio::test]
async fn test_send_requires_membership() {
    let fixture = start_chat().await;

    let mut alice = ChatClient::connect(&fixture.url, "alice-token").await.unwrap();
    alice
        .send_message(fixture.request_id, "hello?", None)
        .await
        .unwrap();

    match next(&mut alice).await {
        ChatFrame::Error { message } => {
            assert_eq!(message, "Join the chat before sending messages");
        }
        other => panic!("unexpected frame {:?}", other),
    }
}

#[tokio::test]
async fn test_blank_messages_are_rejected() {
    let fixture = start_chat().await;

    let mut alice = ChatClient::connect(&fixture.url, "alice-token").await.unwrap();
    alice.join(fixture.request_id).await.unwrap();
    alice
        .send_message(fixture.request_id, "   ", None)
        .await
        .unwrap();

    assert!(matches!(next(&mut alice).await, ChatFrame::Error { .. }));
}
