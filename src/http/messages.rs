use super::{AuthUser, SharedState};
use crate::error::AppResult;
use crate::models::{Message, NewMessage};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

/// `GET /messages/{request_id}`: Chat history, oldest first.
pub async fn history(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<Vec<Message>>> {
    Ok(Json(state.message_service.history(auth.user.id, request_id).await?))
}

/// `POST /messages`
pub async fn post_message(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(body): Json<NewMessage>,
) -> AppResult<(StatusCode, Json<Message>)> {
    let message = state
        .message_service
        .post(auth.user.id, body.barter_request_id, &body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}
