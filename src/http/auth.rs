//! Registration, login and logout.

use super::{AuthUser, SharedState};
use crate::error::AppResult;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;

/// `POST /auth/register`: Create an account and return its first token.
pub async fn register(
    State(state): State<SharedState>,
    Json(form): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let auth = state.auth_service.register(&form).await?;
    Ok((StatusCode::CREATED, Json(auth)))
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<SharedState>,
    Json(form): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    Ok(Json(state.auth_service.login(&form).await?))
}

/// `POST /auth/logout`: Revoke the calling token.
pub async fn logout(State(state): State<SharedState>, auth: AuthUser) -> AppResult<StatusCode> {
    state.auth_service.logout(&auth.token).await?;
    Ok(StatusCode::NO_CONTENT)
}
