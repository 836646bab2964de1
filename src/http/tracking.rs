use super::{AuthUser, SharedState};
use crate::error::AppResult;
use crate::models::{NewTracking, StepUpdate, TrackingView};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

/// `POST /tracking`: Start the checklist of an accepted item exchange.
pub async fn create_tracking(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(body): Json<NewTracking>,
) -> AppResult<(StatusCode, Json<TrackingView>)> {
    let view = state
        .tracking_service
        .create(auth.user.id, body.barter_request_id)
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// `GET /tracking/request/{request_id}`
pub async fn get_tracking(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<TrackingView>> {
    let view = state
        .tracking_service
        .get_for_request(auth.user.id, request_id)
        .await?;
    Ok(Json(view))
}

/// `PUT /tracking/{id}/step`
pub async fn complete_step(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(tracking_id): Path<Uuid>,
    Json(body): Json<StepUpdate>,
) -> AppResult<Json<TrackingView>> {
    let view = state
        .tracking_service
        .complete_step(auth.user.id, tracking_id, body.step)
        .await?;
    Ok(Json(view))
}
