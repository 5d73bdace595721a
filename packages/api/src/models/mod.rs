//! Data models for the application.

mod upload;
mod user;

pub use upload::{NewUpload, ScanKind, Upload, UploadInfo};
pub use user::{ProfileUpdate, User, UserInfo};
