//! # API crate - server side of MediScan
//!
//! Everything the HTTP server needs apart from the inference pipeline itself
//! (which lives in the `classifier` crate): configuration, persistence,
//! accounts, upload storage, the chat relay and the axum routes that tie them
//! together.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`settings`] | Layered configuration (defaults → `config.toml` → environment) |
//! | [`db`] | SQLite pool, migrations, and the `users` / `uploads` repositories |
//! | [`models`] | Database rows (`User`, `Upload`) and their client-safe projections |
//! | [`auth`] | Argon2 password hashing, registration rules, session helpers |
//! | [`storage`] | Uploaded image storage under generated, collision-free names |
//! | [`chat`] | Stateless relay to an OpenAI-compatible chat completions API |
//! | [`state`] | [`AppState`] shared by every handler |
//! | [`routes`] | The axum router and its handlers |
//! | [`error`] | [`ApiError`] and its mapping to HTTP responses |
//!
//! ## Endpoints
//!
//! - **Accounts**: `POST /api/auth/register`, `POST /api/auth/login`,
//!   `POST /api/auth/logout`, `GET /api/auth/me`, `GET|POST /api/profile`
//! - **Scans**: `POST /api/upload/brain`, `POST /api/upload/pneumonia`,
//!   `GET /api/dashboard`, `GET /uploads/{file}`
//! - **Assistant**: `POST /api/chat`
//! - **Ops**: `GET /health`

pub mod auth;
pub mod chat;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod settings;
pub mod state;
pub mod storage;

pub use error::ApiError;
pub use models::{UploadInfo, UserInfo};
pub use settings::Settings;
pub use state::AppState;
