//! MediScan server binary: load settings and models, open the database, and
//! serve the API with cookie sessions.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use api::chat::ChatRelay;
use api::storage::UploadStore;
use api::{AppState, Settings};
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::new().context("failed to load configuration")?;

    let pool = api::db::connect(&settings.database)
        .await
        .context("failed to connect to database")?;
    api::db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    let session_store = SqliteStore::new(pool.clone());
    session_store
        .migrate()
        .await
        .context("failed to create session table")?;

    let expiry = time_days(settings.session.expiry_days)?;
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(settings.session.secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(expiry));

    let models = load_models(settings.models.clone()).await?;
    tracing::info!(
        brain = models.brain.is_some(),
        pneumonia = models.pneumonia.is_some(),
        "models loaded"
    );

    let uploads = UploadStore::init(&settings.storage)
        .await
        .with_context(|| format!("failed to create {}", settings.storage.upload_dir.display()))?;

    let chat = ChatRelay::new(settings.chat.clone());
    if !chat.is_configured() {
        tracing::warn!("OPENAI_API_KEY not set; /api/chat will return errors");
    }

    let state = AppState::new(pool, models, settings.labels.clone(), uploads, chat);
    let app = api::routes::build_router(state).layer(session_layer);

    let listener = tokio::net::TcpListener::bind(&settings.server.address)
        .await
        .with_context(|| format!("failed to bind {}", settings.server.address))?;
    tracing::info!("Server listening on {}", settings.server.address);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Model deserialization is CPU-bound, so it runs off the runtime threads.
async fn load_models(settings: classifier::ModelSettings) -> anyhow::Result<classifier::LoadedModels> {
    let models = tokio::task::spawn_blocking(move || classifier::load_models(&settings))
        .await
        .context("model loading task panicked")?;
    Ok(models)
}

fn time_days(days: u64) -> anyhow::Result<tower_sessions::cookie::time::Duration> {
    Duration::from_secs(60 * 60 * 24 * days)
        .try_into()
        .context("session expiry out of range")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("shutting down");
}
