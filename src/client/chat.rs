use super::{ClientError, ClientResult};
use crate::chat::ChatFrame;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

/// Chat socket connection for one user
pub struct ChatClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    user_id: Uuid,
}

impl ChatClient {
    /// Connect and wait for the server to accept the token
    pub async fn connect(url: &str, token: &str) -> ClientResult<Self> {
        let mut request = url.into_client_request()?;
        request.headers_mut().insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ClientError::Api {
                    status: 400,
                    message: e.to_string(),
                })?,
        );

        let (stream, _) = connect_async(request).await?;
        let mut client = Self {
            stream,
            user_id: Uuid::nil(),
        };

        match client.next_frame().await? {
            ChatFrame::Connected { user_id } => {
                client.user_id = user_id;
                Ok(client)
            }
            ChatFrame::Error { message } => Err(ClientError::Api {
                status: 401,
                message,
            }),
            _ => Err(ClientError::WsClosed),
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Enter the room of a request and wait for the server's answer
    pub async fn join(&mut self, request_id: Uuid) -> ClientResult<()> {
        self.send(&ChatFrame::JoinChat { request_id }).await?;
        match self.next_frame().await? {
            ChatFrame::Joined { request_id: joined } if joined == request_id => Ok(()),
            ChatFrame::Error { message } => Err(ClientError::Api {
                status: 403,
                message,
            }),
            _ => Err(ClientError::WsClosed),
        }
    }

    pub async fn leave(&mut self, request_id: Uuid) -> ClientResult<()> {
        self.send(&ChatFrame::LeaveChat { request_id }).await
    }

    /// Relay a message to the other members of the room
    pub async fn send_message(
        &mut self,
        request_id: Uuid,
        message: &str,
        message_id: Option<Uuid>,
    ) -> ClientResult<()> {
        self.send(&ChatFrame::SendMessage {
            request_id,
            message: message.to_string(),
            message_id,
        })
        .await
    }

    pub async fn send(&mut self, frame: &ChatFrame) -> ClientResult<()> {
        let json = serde_json::to_string(frame)?;
        self.stream.send(Message::Text(json.into())).await?;
        Ok(())
    }

    /// Next frame from the server, skipping control messages
    pub async fn next_frame(&mut self) -> ClientResult<ChatFrame> {
        while let Some(msg) = self.stream.next().await {
            match msg? {
                Message::Text(text) => return Ok(serde_json::from_str(text.as_str())?),
                Message::Close(_) => return Err(ClientError::WsClosed),
                _ => continue,
            }
        }
        Err(ClientError::WsClosed)
    }

    pub async fn close(mut self) -> ClientResult<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}
