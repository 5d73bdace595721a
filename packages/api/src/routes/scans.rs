//! Scan uploads: store the image, classify it off the async runtime, record
//! the result.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::Json;
use classifier::{predict_brain_tumor, predict_pneumonia, Prediction};
use serde::Serialize;
use tower_sessions::Session;

use crate::auth::current_user_id;
use crate::db::UploadRepo;
use crate::error::ApiError;
use crate::models::{NewUpload, ScanKind};
use crate::state::AppState;
use crate::storage::{StorageError, StoredFile};

/// Multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub id: i64,
    pub filename: String,
    pub image_url: String,
    pub mode: ScanKind,
    pub result: Prediction,
}

/// POST /api/upload/brain
pub async fn upload_brain(
    State(state): State<Arc<AppState>>,
    session: Session,
    multipart: Multipart,
) -> Result<Json<ScanResponse>, ApiError> {
    scan(state, session, multipart, ScanKind::Brain).await
}

/// POST /api/upload/pneumonia
pub async fn upload_pneumonia(
    State(state): State<Arc<AppState>>,
    session: Session,
    multipart: Multipart,
) -> Result<Json<ScanResponse>, ApiError> {
    scan(state, session, multipart, ScanKind::Pneumonia).await
}

#[tracing::instrument(skip(state, session, multipart), fields(mode = kind.as_str()))]
async fn scan(
    state: Arc<AppState>,
    session: Session,
    multipart: Multipart,
    kind: ScanKind,
) -> Result<Json<ScanResponse>, ApiError> {
    let user_id = current_user_id(&session).await?;
    let (filename, bytes) = read_file_field(multipart).await?;

    let stored = state.uploads.save(&filename, &bytes).await?;

    // A failed scan leaves no stored file behind.
    let (id, prediction) = match classify_and_record(&state, kind, &stored, user_id).await {
        Ok(recorded) => recorded,
        Err(e) => {
            state.uploads.remove(&stored).await;
            return Err(e);
        }
    };

    Ok(Json(ScanResponse {
        id,
        image_url: format!("/uploads/{}", stored.key),
        filename: stored.key,
        mode: kind,
        result: prediction,
    }))
}

async fn classify_and_record(
    state: &AppState,
    kind: ScanKind,
    stored: &StoredFile,
    user_id: Option<i64>,
) -> Result<(i64, Prediction), ApiError> {
    let prediction = classify(state, kind, stored.path.clone()).await?;

    let record = NewUpload::for_scan(kind, &stored.key, user_id, &prediction.label, prediction.score)
        .with_original_filename(&stored.original_name);
    let id = UploadRepo::create(&state.pool, &record).await?;

    tracing::info!(
        upload_id = id,
        label = %prediction.label,
        score = prediction.score,
        "scan classified"
    );
    Ok((id, prediction))
}

/// Run the blocking prediction pipeline for `kind` on a blocking thread.
async fn classify(state: &AppState, kind: ScanKind, path: PathBuf) -> Result<Prediction, ApiError> {
    let (model, labels) = match kind {
        ScanKind::Brain => (state.models.brain.clone(), state.labels.brain.clone()),
        ScanKind::Pneumonia => (
            state.models.pneumonia.clone(),
            state.labels.pneumonia.clone(),
        ),
    };

    let prediction = tokio::task::spawn_blocking(move || match kind {
        ScanKind::Brain => predict_brain_tumor(&path, model.as_deref(), &labels),
        ScanKind::Pneumonia => predict_pneumonia(&path, model.as_deref(), &labels),
    })
    .await
    .map_err(|e| ApiError::Internal(format!("inference task failed: {}", e)))??;

    Ok(prediction)
}

/// First `file` field with a non-empty filename.
async fn read_file_field(mut multipart: Multipart) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            break;
        }
        let bytes = field.bytes().await?;
        return Ok((filename, bytes));
    }

    Err(StorageError::Empty.into())
}
