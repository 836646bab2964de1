//! Typed client for the REST API and the chat socket.
//!
//! A thin wrapper: every call attaches the bearer token, there is no retry
//! or caching, and a failed call surfaces as the status code plus the
//! server's error message.

pub mod chat;

pub use chat::ChatClient;

use crate::models::{
    AuthResponse, BarterActivity, BarterRequest, BarterRequestLists, Item, ListingFilter,
    LoginRequest, Message, NewBarterRequest, NewItem, NewMessage, NewPoll, NewSession,
    NewSkill, NewTracking, PollView, ProfileUpdate, PublicProfile, RegisterRequest,
    RequestDirection, RescheduleRequest, RescheduleResponse, Session, Skill, StatusUpdate,
    StepUpdate, TrackingView, User, VoteRequest,
};
use crate::workflow::{BarterStatus, TrackingStep};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("not logged in")]
    MissingToken,
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("websocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket closed")]
    WsClosed,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl ClientError {
    /// HTTP status of a server-side failure
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::WebSocket(Box::new(err))
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// REST API client
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ---------------------------------------------------------------------
    // auth & profile
    // ---------------------------------------------------------------------

    /// Register and keep the issued token
    pub async fn register(&mut self, form: &RegisterRequest) -> ClientResult<AuthResponse> {
        let auth: AuthResponse = self.send_json(Method::POST, "/auth/register", form, false).await?;
        self.token = Some(auth.token.clone());
        Ok(auth)
    }

    /// Log in and keep the issued token
    pub async fn login(&mut self, login: &str, password: &str) -> ClientResult<AuthResponse> {
        let form = LoginRequest {
            login: login.to_string(),
            password: password.to_string(),
        };
        let auth: AuthResponse = self.send_json(Method::POST, "/auth/login", &form, false).await?;
        self.token = Some(auth.token.clone());
        Ok(auth)
    }

    pub async fn logout(&mut self) -> ClientResult<()> {
        let request = self.request(Method::POST, "/auth/logout", true)?;
        expect_success(request.send().await?).await?;
        self.token = None;
        Ok(())
    }

    pub async fn me(&self) -> ClientResult<User> {
        self.get("/users/me").await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<User> {
        self.send_json(Method::PUT, "/users/me", update, true).await
    }

    pub async fn profile(&self, user_id: Uuid) -> ClientResult<PublicProfile> {
        self.get(&format!("/users/{}", user_id)).await
    }

    // ---------------------------------------------------------------------
    // listings
    // ---------------------------------------------------------------------

    pub async fn skills(&self, filter: &ListingFilter) -> ClientResult<Vec<Skill>> {
        let request = self.request(Method::GET, "/skills", true)?.query(filter);
        decode(request.send().await?).await
    }

    pub async fn create_skill(&self, skill: &NewSkill) -> ClientResult<Skill> {
        self.send_json(Method::POST, "/skills", skill, true).await
    }

    pub async fn delete_skill(&self, skill_id: Uuid) -> ClientResult<()> {
        self.delete(&format!("/skills/{}", skill_id)).await
    }

    pub async fn items(&self, filter: &ListingFilter) -> ClientResult<Vec<Item>> {
        let request = self.request(Method::GET, "/items", true)?.query(filter);
        decode(request.send().await?).await
    }

    pub async fn create_item(&self, item: &NewItem) -> ClientResult<Item> {
        self.send_json(Method::POST, "/items", item, true).await
    }

    pub async fn delete_item(&self, item_id: Uuid) -> ClientResult<()> {
        self.delete(&format!("/items/{}", item_id)).await
    }

    // ---------------------------------------------------------------------
    // polls
    // ---------------------------------------------------------------------

    pub async fn polls(&self) -> ClientResult<Vec<PollView>> {
        self.get("/polls").await
    }

    pub async fn poll(&self, poll_id: Uuid) -> ClientResult<PollView> {
        self.get(&format!("/polls/{}", poll_id)).await
    }

    pub async fn create_poll(&self, poll: &NewPoll) -> ClientResult<PollView> {
        self.send_json(Method::POST, "/polls", poll, true).await
    }

    pub async fn vote(&self, poll_id: Uuid, option_index: i32) -> ClientResult<PollView> {
        let body = VoteRequest { option_index };
        self.send_json(Method::POST, &format!("/polls/{}/vote", poll_id), &body, true)
            .await
    }

    // ---------------------------------------------------------------------
    // barter requests
    // ---------------------------------------------------------------------

    pub async fn create_request(&self, request: &NewBarterRequest) -> ClientResult<BarterRequest> {
        self.send_json(Method::POST, "/barter", request, true).await
    }

    pub async fn requests(
        &self,
        direction: Option<RequestDirection>,
    ) -> ClientResult<BarterRequestLists> {
        let mut request = self.request(Method::GET, "/barter/requests", true)?;
        if let Some(direction) = direction {
            request = request.query(&[("direction", direction.as_str())]);
        }
        decode(request.send().await?).await
    }

    pub async fn request_by_id(&self, request_id: Uuid) -> ClientResult<BarterRequest> {
        self.get(&format!("/barter/{}", request_id)).await
    }

    pub async fn update_status(
        &self,
        request_id: Uuid,
        status: BarterStatus,
    ) -> ClientResult<BarterRequest> {
        let body = StatusUpdate { status };
        self.send_json(Method::PUT, &format!("/barter/{}/status", request_id), &body, true)
            .await
    }

    pub async fn activity(&self) -> ClientResult<Vec<BarterActivity>> {
        self.get("/barter/activity").await
    }

    // ---------------------------------------------------------------------
    // sessions
    // ---------------------------------------------------------------------

    pub async fn create_session(&self, session: &NewSession) -> ClientResult<Session> {
        self.send_json(Method::POST, "/sessions", session, true).await
    }

    pub async fn sessions(&self, request_id: Uuid) -> ClientResult<Vec<Session>> {
        self.get(&format!("/sessions/request/{}", request_id)).await
    }

    pub async fn confirm_session(&self, session_id: Uuid) -> ClientResult<Session> {
        self.put_empty(&format!("/sessions/{}/confirm", session_id)).await
    }

    pub async fn cancel_session(&self, session_id: Uuid) -> ClientResult<Session> {
        self.put_empty(&format!("/sessions/{}/cancel", session_id)).await
    }

    pub async fn complete_session(&self, session_id: Uuid) -> ClientResult<Session> {
        self.put_empty(&format!("/sessions/{}/complete", session_id)).await
    }

    pub async fn request_reschedule(
        &self,
        session_id: Uuid,
        proposal: &RescheduleRequest,
    ) -> ClientResult<Session> {
        self.send_json(
            Method::PUT,
            &format!("/sessions/{}/reschedule", session_id),
            proposal,
            true,
        )
        .await
    }

    pub async fn respond_reschedule(&self, session_id: Uuid, accept: bool) -> ClientResult<Session> {
        self.send_json(
            Method::PUT,
            &format!("/sessions/{}/reschedule/respond", session_id),
            &RescheduleResponse { accept },
            true,
        )
        .await
    }

    // ---------------------------------------------------------------------
    // tracking
    // ---------------------------------------------------------------------

    pub async fn create_tracking(&self, request_id: Uuid) -> ClientResult<TrackingView> {
        let body = NewTracking {
            barter_request_id: request_id,
        };
        self.send_json(Method::POST, "/tracking", &body, true).await
    }

    pub async fn tracking(&self, request_id: Uuid) -> ClientResult<TrackingView> {
        self.get(&format!("/tracking/request/{}", request_id)).await
    }

    pub async fn complete_step(
        &self,
        tracking_id: Uuid,
        step: TrackingStep,
    ) -> ClientResult<TrackingView> {
        self.send_json(
            Method::PUT,
            &format!("/tracking/{}/step", tracking_id),
            &StepUpdate { step },
            true,
        )
        .await
    }

    // ---------------------------------------------------------------------
    // messages
    // ---------------------------------------------------------------------

    pub async fn messages(&self, request_id: Uuid) -> ClientResult<Vec<Message>> {
        self.get(&format!("/messages/{}", request_id)).await
    }

    pub async fn post_message(&self, request_id: Uuid, content: &str) -> ClientResult<Message> {
        let body = NewMessage {
            barter_request_id: request_id,
            content: content.to_string(),
        };
        self.send_json(Method::POST, "/messages", &body, true).await
    }

    // ---------------------------------------------------------------------
    // plumbing
    // ---------------------------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str, authed: bool) -> ClientResult<RequestBuilder> {
        let request = self.http.request(method, self.url(path));
        if !authed {
            return Ok(request);
        }
        let token = self.token.as_deref().ok_or(ClientError::MissingToken)?;
        Ok(request.bearer_auth(token))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let request = self.request(Method::GET, path, true)?;
        decode(request.send().await?).await
    }

    async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let request = self.request(Method::PUT, path, true)?;
        decode(request.send().await?).await
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        let request = self.request(Method::DELETE, path, true)?;
        expect_success(request.send().await?).await?;
        Ok(())
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        authed: bool,
    ) -> ClientResult<T> {
        let request = self.request(method, path, authed)?.json(body);
        decode(request.send().await?).await
    }
}

/// Turn a non-2xx response into `ClientError::Api`
async fn expect_success(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(body);

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let response = expect_success(response).await?;
    Ok(response.json::<T>().await?)
}
