use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tower_sessions::Session;

use super::auth::require_user;
use crate::db::UploadRepo;
use crate::error::ApiError;
use crate::models::{UploadInfo, UserInfo};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user: UserInfo,
    /// Most recent first.
    pub uploads: Vec<UploadInfo>,
}

/// GET /api/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<DashboardResponse>, ApiError> {
    let user = require_user(&state, &session).await?;
    let uploads = UploadRepo::list_by_user(&state.pool, user.id).await?;

    Ok(Json(DashboardResponse {
        user: user.to_info(),
        uploads: uploads.iter().map(|u| u.to_info()).collect(),
    }))
}
