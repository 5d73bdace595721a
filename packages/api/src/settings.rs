use std::path::{Path, PathBuf};

use classifier::{LabelConfig, ModelSettings};
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::chat::ChatSettings;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl DatabaseSettings {
    /// A private in-memory database. The pool is pinned to one connection
    /// because every SQLite memory connection is its own database.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub upload_dir: PathBuf,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["png".into(), "jpg".into(), "jpeg".into()]
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

impl StorageSettings {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            allowed_extensions: default_allowed_extensions(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Only send the session cookie over HTTPS.
    pub secure: bool,
    pub expiry_days: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub session: SessionSettings,
    #[serde(default)]
    pub models: ModelSettings,
    #[serde(default)]
    pub labels: LabelConfig,
    #[serde(default)]
    pub chat: ChatSettings,
}

impl Settings {
    /// Load settings from `config.toml` in the working directory (optional)
    /// and the environment.
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(Path::new("config.toml"))
    }

    /// Load settings with `file` as the optional TOML layer.
    ///
    /// Environment variables use the `MEDISCAN` prefix with `__` between
    /// sections, e.g. `MEDISCAN__SERVER__ADDRESS`. `DATABASE_URL` and
    /// `OPENAI_API_KEY` are honoured as-is.
    pub fn load(file: &Path) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .set_default("server.address", "127.0.0.1:8080")?
            .set_default("database.url", "sqlite://mediscan.db")?
            .set_default("storage.upload_dir", "static/uploads")?
            .set_default("session.secure", false)?
            .set_default("session.expiry_days", 7)?
            .add_source(File::from(file).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("MEDISCAN")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;

        if let Ok(url) = std::env::var("DATABASE_URL") {
            settings.database.url = url;
        }
        if settings.chat.api_key.is_none() {
            settings.chat.api_key = std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty());
        }

        Ok(settings)
    }
}
