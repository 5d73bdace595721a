//! Upload records: one row per classification request.
//!
//! Rows are append-only. Exactly one of `result_brain` / `result_pneumonia` is
//! filled, depending on which scan route created the row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Which classifier a scan was sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanKind {
    Brain,
    Pneumonia,
}

impl ScanKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScanKind::Brain => "brain",
            ScanKind::Pneumonia => "pneumonia",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Upload {
    pub id: i64,
    /// Storage key of the image inside the upload directory.
    pub filename: String,
    pub original_filename: Option<String>,
    pub user_id: Option<i64>,
    pub result_brain: Option<String>,
    pub result_pneumonia: Option<String>,
    pub score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Upload {
    pub fn image_url(&self) -> String {
        format!("/uploads/{}", self.filename)
    }

    pub fn to_info(&self) -> UploadInfo {
        UploadInfo {
            id: self.id,
            filename: self.filename.clone(),
            original_filename: self.original_filename.clone(),
            image_url: self.image_url(),
            result_brain: self.result_brain.clone(),
            result_pneumonia: self.result_pneumonia.clone(),
            score: self.score,
            created_at: self.created_at,
        }
    }
}

/// Upload as returned by the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadInfo {
    pub id: i64,
    pub filename: String,
    pub original_filename: Option<String>,
    pub image_url: String,
    pub result_brain: Option<String>,
    pub result_pneumonia: Option<String>,
    pub score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Values for a new upload row.
#[derive(Debug, Clone, Default)]
pub struct NewUpload {
    pub filename: String,
    pub original_filename: Option<String>,
    pub user_id: Option<i64>,
    pub result_brain: Option<String>,
    pub result_pneumonia: Option<String>,
    pub score: Option<f64>,
}

impl NewUpload {
    /// Row for a finished scan of `kind`; the other result column stays empty.
    pub fn for_scan(
        kind: ScanKind,
        filename: impl Into<String>,
        user_id: Option<i64>,
        label: impl Into<String>,
        score: f64,
    ) -> Self {
        let label = Some(label.into());
        let (result_brain, result_pneumonia) = match kind {
            ScanKind::Brain => (label, None),
            ScanKind::Pneumonia => (None, label),
        };

        Self {
            filename: filename.into(),
            original_filename: None,
            user_id,
            result_brain,
            result_pneumonia,
            score: Some(score),
        }
    }

    pub fn with_original_filename(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.original_filename = (!name.is_empty()).then_some(name);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_rows_fill_exactly_one_result() {
        let brain = NewUpload::for_scan(ScanKind::Brain, "a.png", Some(1), "No Tumor", 0.8);
        assert_eq!(brain.result_brain.as_deref(), Some("No Tumor"));
        assert!(brain.result_pneumonia.is_none());

        let pneumonia = NewUpload::for_scan(ScanKind::Pneumonia, "b.png", None, "Normal", 0.7);
        assert!(pneumonia.result_brain.is_none());
        assert_eq!(pneumonia.result_pneumonia.as_deref(), Some("Normal"));
        assert!(pneumonia.user_id.is_none());
    }

    #[test]
    fn empty_original_name_is_not_stored() {
        let upload = NewUpload::for_scan(ScanKind::Brain, "k.png", None, "x", 0.5)
            .with_original_filename("");
        assert!(upload.original_filename.is_none());
    }
}
