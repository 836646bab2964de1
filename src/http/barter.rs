//! Barter request routes.

use super::{AuthUser, SharedState};
use crate::error::AppResult;
use crate::models::{
    BarterActivity, BarterRequest, BarterRequestLists, NewBarterRequest, RequestDirection,
    StatusUpdate,
};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RequestsQuery {
    pub direction: Option<RequestDirection>,
}

/// `POST /barter`
pub async fn create_request(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(new): Json<NewBarterRequest>,
) -> AppResult<(StatusCode, Json<BarterRequest>)> {
    let request = state.barter_service.create_request(auth.user.id, &new).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// `GET /barter/requests?direction=incoming|outgoing`
pub async fn list_requests(
    State(state): State<SharedState>,
    auth: AuthUser,
    Query(query): Query<RequestsQuery>,
) -> AppResult<Json<BarterRequestLists>> {
    let lists = state
        .barter_service
        .list_requests(auth.user.id, query.direction)
        .await?;
    Ok(Json(lists))
}

/// `GET /barter/{id}`: Parties only.
pub async fn get_request(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<BarterRequest>> {
    Ok(Json(state.barter_service.get_request(auth.user.id, request_id).await?))
}

/// `PUT /barter/{id}/status`: User-driven transitions only.
pub async fn update_status(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(request_id): Path<Uuid>,
    Json(body): Json<StatusUpdate>,
) -> AppResult<Json<BarterRequest>> {
    let request = state
        .barter_service
        .update_status(auth.user.id, request_id, body.status)
        .await?;
    Ok(Json(request))
}

/// `GET /barter/activity`
pub async fn activity(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<BarterActivity>>> {
    Ok(Json(state.barter_service.activity(auth.user.id).await?))
}
