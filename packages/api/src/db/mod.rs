//! # Database module: SQLite pool, migrations and repositories
//!
//! The pool is created once by the binary and carried in
//! [`AppState`](crate::state::AppState); nothing in this crate reaches for a
//! global connection.
//!
//! ## Contents
//!
//! - [`connect`] / [`run_migrations`]: open the pool and apply
//!   `migrations/*.sql`.
//! - [`UserRepo`]: accounts (`users` table).
//! - [`UploadRepo`]: append-only classification records (`uploads` table).

mod pool;
mod uploads;
mod users;

pub use pool::{connect, run_migrations};
pub use uploads::UploadRepo;
pub use users::{is_unique_violation, UserRepo};
