//! Skill and item listings.

use super::{AuthUser, SharedState};
use crate::error::AppResult;
use crate::models::{Item, ListingFilter, NewItem, NewSkill, Skill};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

/// `GET /skills?category=&search=&user_id=`
pub async fn list_skills(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Query(filter): Query<ListingFilter>,
) -> AppResult<Json<Vec<Skill>>> {
    Ok(Json(state.listing_service.list_skills(&filter).await?))
}

/// `POST /skills`
pub async fn create_skill(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(skill): Json<NewSkill>,
) -> AppResult<(StatusCode, Json<Skill>)> {
    let skill = state.listing_service.create_skill(auth.user.id, &skill).await?;
    Ok((StatusCode::CREATED, Json(skill)))
}

/// `DELETE /skills/{id}`: Owner only.
pub async fn delete_skill(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(skill_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.listing_service.delete_skill(auth.user.id, skill_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /items?category=&search=&user_id=`
pub async fn list_items(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Query(filter): Query<ListingFilter>,
) -> AppResult<Json<Vec<Item>>> {
    Ok(Json(state.listing_service.list_items(&filter).await?))
}

/// `POST /items`
pub async fn create_item(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(item): Json<NewItem>,
) -> AppResult<(StatusCode, Json<Item>)> {
    let item = state.listing_service.create_item(auth.user.id, &item).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// `DELETE /items/{id}`: Owner only.
pub async fn delete_item(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.listing_service.delete_item(auth.user.id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
