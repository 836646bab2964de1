//! REST API.
//!
//! One axum router over the shared [`AppState`]. Every route except
//! registration, login and the health check requires an
//! `Authorization: Bearer <token>` header, enforced by the [`AuthUser`]
//! extractor. Failures render as `{"error": "<message>"}` through
//! `AppError`'s `IntoResponse`.

pub mod auth;
pub mod barter;
pub mod listings;
pub mod messages;
pub mod polls;
pub mod sessions;
pub mod tracking;
pub mod users;

use crate::error::AppError;
use crate::models::User;
use crate::AppState;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{delete, get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub type SharedState = Arc<AppState>;

/// Authenticated caller, resolved from the bearer token
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;
        let token = crate::auth::parse_bearer(header)?.to_string();

        let user = state.auth_service.authenticate(&token).await?;
        Ok(Self { user, token })
    }
}

/// Build the API router
pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/users/me", get(users::me).put(users::update_me))
        .route("/users/{id}", get(users::profile))
        .route("/skills", get(listings::list_skills).post(listings::create_skill))
        .route("/skills/{id}", delete(listings::delete_skill))
        .route("/items", get(listings::list_items).post(listings::create_item))
        .route("/items/{id}", delete(listings::delete_item))
        .route("/polls", get(polls::list_polls).post(polls::create_poll))
        .route("/polls/{id}", get(polls::get_poll))
        .route("/polls/{id}/vote", post(polls::vote))
        .route("/barter", post(barter::create_request))
        .route("/barter/requests", get(barter::list_requests))
        .route("/barter/activity", get(barter::activity))
        .route("/barter/{id}", get(barter::get_request))
        .route("/barter/{id}/status", put(barter::update_status))
        .route("/sessions", post(sessions::create_session))
        .route("/sessions/request/{request_id}", get(sessions::list_sessions))
        .route("/sessions/{id}/confirm", put(sessions::confirm))
        .route("/sessions/{id}/cancel", put(sessions::cancel))
        .route("/sessions/{id}/complete", put(sessions::complete))
        .route("/sessions/{id}/reschedule", put(sessions::request_reschedule))
        .route(
            "/sessions/{id}/reschedule/respond",
            put(sessions::respond_reschedule),
        )
        .route("/tracking", post(tracking::create_tracking))
        .route("/tracking/request/{request_id}", get(tracking::get_tracking))
        .route("/tracking/{id}/step", put(tracking::complete_step))
        .route("/messages", post(messages::post_message))
        .route("/messages/{request_id}", get(messages::history))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// `GET /healthz`: Liveness plus a database ping.
async fn healthz(State(state): State<SharedState>) -> impl IntoResponse {
    match state.database.ping().await {
        Ok(latency) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "database_latency_ms": latency.as_millis() as u64,
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "degraded" })),
            )
        }
    }
}
