//! [`ApiError`]: every failure a handler can return, and the status code and
//! JSON body `{"error": "..."}` each one turns into.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use classifier::ClassifierError;
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::chat::ChatError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Login required")]
    Unauthorized,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// Unreadable multipart body, including one over the size limit (413).
    #[error("{}", .0.body_text())]
    Multipart(#[from] MultipartError),

    /// The upload was stored but is not a decodable image.
    #[error("{0}")]
    UnreadableImage(String),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("{0}")]
    Internal(String),
}

impl From<ClassifierError> for ApiError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::Decode(_) => ApiError::UnreadableImage(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Hash(reason) => ApiError::Internal(reason),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Multipart(e) => e.status(),
            ApiError::UnreadableImage(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Chat(ChatError::EmptyMessage) => StatusCode::BAD_REQUEST,
            ApiError::Chat(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Storage(StorageError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Storage(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) | ApiError::Session(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the client. Chat failures pass through so the user
    /// sees what the upstream said; other server-side failures do not.
    fn public_message(&self) -> String {
        match self {
            ApiError::Database(_)
            | ApiError::Session(_)
            | ApiError::Internal(_)
            | ApiError::Storage(StorageError::Io(_)) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(ApiError::Chat(ChatError::EmptyMessage).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Chat(ChatError::MissingApiKey).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Storage(StorageError::Empty).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(AuthError::PasswordTooShort).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn decode_failures_are_unprocessable() {
        let decode = image::ImageError::IoError(std::io::Error::other("truncated"));
        let err = ApiError::from(ClassifierError::Decode(decode));
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = ApiError::from(ClassifierError::EmptyOutput);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn internal_details_stay_out_of_the_body() {
        let err = ApiError::Internal("pool exhausted".into());
        assert_eq!(err.public_message(), "Internal server error");
        assert_eq!(
            ApiError::Chat(ChatError::EmptyMessage).public_message(),
            "No message provided"
        );
    }
}
