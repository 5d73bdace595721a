use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tower_sessions::Session;

use crate::auth::{
    current_user_id, default_name, hash_password, normalize_email, sign_in, sign_out,
    validate_registration, verify_password,
};
use crate::db::{is_unique_violation, UserRepo};
use crate::error::ApiError;
use crate::models::{User, UserInfo};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The logged-in user, or [`ApiError::Unauthorized`]. A session pointing at a
/// user that no longer exists counts as logged out.
pub async fn require_user(state: &AppState, session: &Session) -> Result<User, ApiError> {
    let user_id = current_user_id(session).await?.ok_or(ApiError::Unauthorized)?;
    UserRepo::get_by_id(&state.pool, user_id)
        .await?
        .ok_or(ApiError::Unauthorized)
}

/// POST /api/auth/register
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserInfo>), ApiError> {
    let email = normalize_email(&req.email);
    validate_registration(&email, &req.password)?;

    let name = default_name(&email, req.name.as_deref());
    let password_hash = hash_password(&req.password)?;

    let user = match UserRepo::create(&state.pool, &email, &password_hash, &name).await {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::Conflict(
                "An account with this email already exists".to_string(),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    sign_in(&session, user.id).await?;
    tracing::info!(user_id = user.id, "registered user");

    Ok((StatusCode::CREATED, Json(user.to_info())))
}

/// POST /api/auth/login
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<UserInfo>, ApiError> {
    let email = normalize_email(&req.email);

    let Some(user) = UserRepo::get_by_email(&state.pool, &email).await? else {
        return Err(ApiError::InvalidCredentials);
    };
    if !verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::InvalidCredentials);
    }

    sign_in(&session, user.id).await?;
    tracing::info!(user_id = user.id, "user logged in");

    Ok(Json(user.to_info()))
}

/// POST /api/auth/logout
pub async fn logout(session: Session) -> Result<StatusCode, ApiError> {
    sign_out(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<Option<UserInfo>>, ApiError> {
    let Some(user_id) = current_user_id(&session).await? else {
        return Ok(Json(None));
    };
    let user = UserRepo::get_by_id(&state.pool, user_id).await?;
    Ok(Json(user.map(|u| u.to_info())))
}
