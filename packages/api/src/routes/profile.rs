use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use tower_sessions::Session;

use super::auth::require_user;
use crate::db::UserRepo;
use crate::error::ApiError;
use crate::models::{ProfileUpdate, UserInfo};
use crate::state::AppState;

/// GET /api/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<UserInfo>, ApiError> {
    let user = require_user(&state, &session).await?;
    Ok(Json(user.to_info()))
}

/// POST /api/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserInfo>, ApiError> {
    let user = require_user(&state, &session).await?;

    let updated = UserRepo::update_profile(&state.pool, user.id, &update.normalized())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::debug!(user_id = user.id, "profile updated");
    Ok(Json(updated.to_info()))
}
