use super::{ChatAuthority, ChatFrame};
use crate::error::{AppError, AppResult};
use crate::services::message_service::validate_content;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

type WsSink = Arc<Mutex<SplitSink<WebSocketStream<TcpStream>, Message>>>;

/// A relayed frame and the room it belongs to
#[derive(Debug, Clone)]
struct RoomEvent {
    request_id: Uuid,
    /// Connection that sent it; it is not echoed back there
    origin: Uuid,
    frame: ChatFrame,
}

/// WebSocket chat server with one room per barter request
pub struct ChatServer {
    authority: Arc<dyn ChatAuthority>,
    tx: broadcast::Sender<RoomEvent>,
    /// request id -> connection ids
    rooms: Arc<RwLock<HashMap<Uuid, Vec<Uuid>>>>,
    /// connection id -> request ids
    client_rooms: Arc<RwLock<HashMap<Uuid, Vec<Uuid>>>>,
}

impl ChatServer {
    pub fn new(authority: Arc<dyn ChatAuthority>) -> Self {
        let (tx, _) = broadcast::channel(1000); // Buffer up to 1000 messages

        Self {
            authority,
            tx,
            rooms: Arc::new(RwLock::new(HashMap::new())),
            client_rooms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Accept connections until the listener fails
    pub async fn serve(&self, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    debug!("New chat connection from {}", addr);
                    let server = self.clone();
                    tokio::spawn(async move {
                        if let Err(e) = server.handle_connection(stream).await {
                            warn!("Chat connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Chat accept error: {}", e);
                }
            }
        }
    }

    /// Number of connections currently in a room
    pub async fn room_size(&self, request_id: Uuid) -> usize {
        self.rooms
            .read()
            .await
            .get(&request_id)
            .map_or(0, Vec::len)
    }

    /// Serve one connection until it closes
    pub async fn handle_connection(&self, stream: TcpStream) -> AppResult<()> {
        let mut token = None;
        let ws_stream = accept_hdr_async(
            stream,
            |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                token = token_from_request(req);
                Ok(resp)
            },
        )
        .await
        .map_err(|e| AppError::Message(format!("WebSocket handshake failed: {}", e)))?;

        let (ws_sender, mut ws_receiver) = ws_stream.split();
        let ws_sender: WsSink = Arc::new(Mutex::new(ws_sender));

        let user_id = match token {
            Some(token) => match self.authority.authenticate(&token).await {
                Ok(user_id) => user_id,
                Err(e) => {
                    send_frame(&ws_sender, &ChatFrame::error(e.client_message())).await;
                    close(&ws_sender).await;
                    return Ok(());
                }
            },
            None => {
                send_frame(&ws_sender, &ChatFrame::error("Missing bearer token")).await;
                close(&ws_sender).await;
                return Ok(());
            }
        };

        let client_id = Uuid::new_v4();
        info!("Chat client {} connected as user {}", client_id, user_id);

        // Subscribe before announcing the connection so nothing sent after
        // a join can be missed.
        let mut rx = self.tx.subscribe();
        send_frame(&ws_sender, &ChatFrame::Connected { user_id }).await;

        let forward_server = self.clone();
        let forward_sender = ws_sender.clone();
        let forwarder = tokio::spawn(async move {
            loop {
                let event = match rx.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Chat client {} lagged, {} frames dropped", client_id, skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                if event.origin == client_id
                    || !forward_server.is_member(client_id, event.request_id).await
                {
                    continue;
                }

                if !send_frame(&forward_sender, &event.frame).await {
                    break;
                }
            }
        });

        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    let reply = match serde_json::from_str::<ChatFrame>(text.as_str()) {
                        Ok(frame) => self.handle_frame(client_id, user_id, frame).await,
                        Err(e) => {
                            debug!("Unparseable frame from {}: {}", client_id, e);
                            Some(ChatFrame::error("Invalid message format"))
                        }
                    };
                    if let Some(reply) = reply {
                        send_frame(&ws_sender, &reply).await;
                    }
                }
                Ok(Message::Close(_)) => {
                    info!("Chat client {} disconnected", client_id);
                    break;
                }
                Err(e) => {
                    warn!("Chat client {} socket error: {}", client_id, e);
                    break;
                }
                _ => {}
            }
        }

        forwarder.abort();
        self.leave_all(client_id).await;
        Ok(())
    }

    async fn handle_frame(&self, client_id: Uuid, user_id: Uuid, frame: ChatFrame) -> Option<ChatFrame> {
        match frame {
            ChatFrame::JoinChat { request_id } => {
                match self.authority.can_join(user_id, request_id).await {
                    Ok(true) => {
                        self.join(client_id, request_id).await;
                        Some(ChatFrame::Joined { request_id })
                    }
                    Ok(false) => Some(ChatFrame::error("You are not a party to this request")),
                    Err(e) => Some(ChatFrame::error(e.client_message())),
                }
            }
            ChatFrame::LeaveChat { request_id } => {
                self.leave(client_id, request_id).await;
                Some(ChatFrame::Left { request_id })
            }
            ChatFrame::SendMessage {
                request_id,
                message,
                message_id,
            } => {
                if !self.is_member(client_id, request_id).await {
                    return Some(ChatFrame::error("Join the chat before sending messages"));
                }
                let message = match validate_content(&message) {
                    Ok(message) => message.to_string(),
                    Err(e) => return Some(ChatFrame::error(e.client_message())),
                };

                let event = RoomEvent {
                    request_id,
                    origin: client_id,
                    frame: ChatFrame::ReceiveMessage {
                        request_id,
                        sender_id: user_id,
                        message,
                        message_id,
                        sent_at: chrono::Utc::now().timestamp(),
                    },
                };
                // No receivers just means nobody else is connected
                let _ = self.tx.send(event);
                None
            }
            _ => Some(ChatFrame::error("Unexpected frame type")),
        }
    }

    async fn join(&self, client_id: Uuid, request_id: Uuid) {
        let mut rooms = self.rooms.write().await;
        let mut client_rooms = self.client_rooms.write().await;

        let members = rooms.entry(request_id).or_default();
        if !members.contains(&client_id) {
            members.push(client_id);
        }
        let joined = client_rooms.entry(client_id).or_default();
        if !joined.contains(&request_id) {
            joined.push(request_id);
        }

        debug!("Client {} joined room {}", client_id, request_id);
    }

    async fn leave(&self, client_id: Uuid, request_id: Uuid) {
        let mut rooms = self.rooms.write().await;
        let mut client_rooms = self.client_rooms.write().await;

        if let Some(members) = rooms.get_mut(&request_id) {
            members.retain(|&id| id != client_id);
            if members.is_empty() {
                rooms.remove(&request_id);
            }
        }
        if let Some(joined) = client_rooms.get_mut(&client_id) {
            joined.retain(|&id| id != request_id);
        }

        debug!("Client {} left room {}", client_id, request_id);
    }

    async fn leave_all(&self, client_id: Uuid) {
        let joined = self
            .client_rooms
            .write()
            .await
            .remove(&client_id)
            .unwrap_or_default();
        for request_id in joined {
            self.leave(client_id, request_id).await;
        }
    }

    async fn is_member(&self, client_id: Uuid, request_id: Uuid) -> bool {
        self.rooms
            .read()
            .await
            .get(&request_id)
            .is_some_and(|members| members.contains(&client_id))
    }
}

impl Clone for ChatServer {
    fn clone(&self) -> Self {
        Self {
            authority: Arc::clone(&self.authority),
            tx: self.tx.clone(),
            rooms: Arc::clone(&self.rooms),
            client_rooms: Arc::clone(&self.client_rooms),
        }
    }
}

/// Bearer token from the `Authorization` header, else from `?token=`
fn token_from_request(req: &Request) -> Option<String> {
    if let Some(header) = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
    {
        if let Ok(token) = crate::auth::parse_bearer(header) {
            return Some(token.to_string());
        }
    }

    req.uri().query().and_then(|query| {
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "token")
            .map(|(_, value)| value.to_string())
            .filter(|value| !value.is_empty())
    })
}

async fn send_frame(sender: &WsSink, frame: &ChatFrame) -> bool {
    let json = match serde_json::to_string(frame) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize chat frame: {}", e);
            return false;
        }
    };
    let mut sender = sender.lock().await;
    match sender.send(Message::Text(json.into())).await {
        Ok(()) => true,
        Err(e) => {
            debug!("Failed to send chat frame: {}", e);
            false
        }
    }
}

async fn close(sender: &WsSink) {
    let mut sender = sender.lock().await;
    let _ = sender.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str, auth: Option<&str>) -> Request {
        let mut builder = Request::builder().uri(uri);
        if let Some(auth) = auth {
            builder = builder.header("Authorization", auth);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_token_from_header_or_query() {
        assert_eq!(
            token_from_request(&request("/chat", Some("Bearer abc"))).as_deref(),
            Some("abc")
        );
        assert_eq!(
            token_from_request(&request("/chat?room=1&token=xyz", None)).as_deref(),
            Some("xyz")
        );
        assert_eq!(token_from_request(&request("/chat?token=", None)), None);
        assert_eq!(token_from_request(&request("/chat", None)), None);
    }
}
