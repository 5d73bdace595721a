use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::{NewUpload, Upload};

const UPLOAD_COLUMNS: &str =
    "id, filename, original_filename, user_id, result_brain, result_pneumonia, score, created_at";

/// Append-only store of classification results.
pub struct UploadRepo;

impl UploadRepo {
    /// Insert a record and return its id.
    pub async fn create(pool: &SqlitePool, upload: &NewUpload) -> Result<i64, sqlx::Error> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO uploads (filename, original_filename, user_id, result_brain, result_pneumonia, score, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&upload.filename)
        .bind(&upload.original_filename)
        .bind(upload.user_id)
        .bind(&upload.result_brain)
        .bind(&upload.result_pneumonia)
        .bind(upload.score)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;
        Ok(id)
    }

    pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<Upload>, sqlx::Error> {
        sqlx::query_as::<_, Upload>(&format!("SELECT {UPLOAD_COLUMNS} FROM uploads WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A user's uploads, most recent first.
    pub async fn list_by_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<Upload>, sqlx::Error> {
        sqlx::query_as::<_, Upload>(&format!(
            "SELECT {UPLOAD_COLUMNS} FROM uploads WHERE user_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
