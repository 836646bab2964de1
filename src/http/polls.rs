use super::{AuthUser, SharedState};
use crate::error::AppResult;
use crate::models::{NewPoll, PollView, VoteRequest};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

/// `GET /polls`
pub async fn list_polls(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<PollView>>> {
    Ok(Json(state.poll_service.list(auth.user.id).await?))
}

/// `POST /polls`: Charges the author the creation cost.
pub async fn create_poll(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(poll): Json<NewPoll>,
) -> AppResult<(StatusCode, Json<PollView>)> {
    let poll = state.poll_service.create(auth.user.id, &poll).await?;
    Ok((StatusCode::CREATED, Json(poll)))
}

/// `GET /polls/{id}`
pub async fn get_poll(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(poll_id): Path<Uuid>,
) -> AppResult<Json<PollView>> {
    Ok(Json(state.poll_service.get(auth.user.id, poll_id).await?))
}

/// `POST /polls/{id}/vote`
pub async fn vote(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(poll_id): Path<Uuid>,
    Json(body): Json<VoteRequest>,
) -> AppResult<Json<PollView>> {
    let poll = state
        .poll_service
        .vote(auth.user.id, poll_id, body.option_index)
        .await?;
    Ok(Json(poll))
}
