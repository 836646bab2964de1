//! Skill session routes.

use super::{AuthUser, SharedState};
use crate::error::AppResult;
use crate::models::{NewSession, RescheduleRequest, RescheduleResponse, Session};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

/// `POST /sessions`
pub async fn create_session(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(new): Json<NewSession>,
) -> AppResult<(StatusCode, Json<Session>)> {
    let session = state.session_service.create(auth.user.id, &new).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// `GET /sessions/request/{request_id}`
pub async fn list_sessions(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<Vec<Session>>> {
    let sessions = state
        .session_service
        .list_for_request(auth.user.id, request_id)
        .await?;
    Ok(Json(sessions))
}

/// `PUT /sessions/{id}/confirm`
pub async fn confirm(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<Session>> {
    Ok(Json(state.session_service.confirm(auth.user.id, session_id).await?))
}

/// `PUT /sessions/{id}/cancel`
pub async fn cancel(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<Session>> {
    Ok(Json(state.session_service.cancel(auth.user.id, session_id).await?))
}

/// `PUT /sessions/{id}/complete`
pub async fn complete(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<Session>> {
    Ok(Json(state.session_service.complete(auth.user.id, session_id).await?))
}

/// `PUT /sessions/{id}/reschedule`
pub async fn request_reschedule(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
    Json(proposal): Json<RescheduleRequest>,
) -> AppResult<Json<Session>> {
    let session = state
        .session_service
        .request_reschedule(auth.user.id, session_id, &proposal)
        .await?;
    Ok(Json(session))
}

/// `PUT /sessions/{id}/reschedule/respond`
pub async fn respond_reschedule(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
    Json(body): Json<RescheduleResponse>,
) -> AppResult<Json<Session>> {
    let session = state
        .session_service
        .respond_reschedule(auth.user.id, session_id, body.accept)
        .await?;
    Ok(Json(session))
}
