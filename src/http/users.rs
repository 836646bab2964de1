use super::{AuthUser, SharedState};
use crate::error::AppResult;
use crate::models::{ProfileUpdate, PublicProfile, User};
use axum::extract::{Path, State};
use axum::response::Json;
use uuid::Uuid;

/// `GET /users/me`
pub async fn me(auth: AuthUser) -> Json<User> {
    Json(auth.user)
}

/// `PUT /users/me`
pub async fn update_me(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> AppResult<Json<User>> {
    Ok(Json(state.user_service.update_profile(&auth.user, &update).await?))
}

/// `GET /users/{id}`
pub async fn profile(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<PublicProfile>> {
    Ok(Json(state.user_service.get_profile(user_id).await?))
}
