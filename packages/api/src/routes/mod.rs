//! The axum router.
//!
//! Handlers take `State<Arc<AppState>>` and, where they need the logged-in
//! user, a [`tower_sessions::Session`]. The session layer itself is added by
//! the binary (or the tests) on top of [`build_router`].

pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod profile;
pub mod scans;

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "models": {
            "brain": state.models.brain.is_some(),
            "pneumonia": state.models.pneumonia.is_some(),
        },
    }))
}

pub fn build_api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/profile", get(profile::get_profile).post(profile::update_profile))
        .route("/upload/brain", post(scans::upload_brain))
        .route("/upload/pneumonia", post(scans::upload_pneumonia))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/chat", post(chat::chat))
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.uploads.max_bytes();
    let uploads = ServeDir::new(state.uploads.dir());

    Router::new()
        .route("/health", get(health))
        .nest("/api", build_api_routes())
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
