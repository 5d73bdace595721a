//! Shared application state.

use std::sync::Arc;

use classifier::{LabelConfig, LoadedModels};
use sqlx::SqlitePool;

use crate::chat::ChatRelay;
use crate::storage::UploadStore;

/// Everything a handler may need. Built once at startup and shared behind an
/// `Arc`; nothing in here is mutated afterwards.
pub struct AppState {
    pub pool: SqlitePool,
    pub models: LoadedModels,
    pub labels: LabelConfig,
    pub uploads: UploadStore,
    pub chat: ChatRelay,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        models: LoadedModels,
        labels: LabelConfig,
        uploads: UploadStore,
        chat: ChatRelay,
    ) -> Arc<Self> {
        Arc::new(Self {
            pool,
            models,
            labels,
            uploads,
            chat,
        })
    }
}
