//! Session glue. The only thing kept in the session is the user id.

use tower_sessions::{session, Session};

/// Key for storing user ID in session.
pub const SESSION_USER_ID_KEY: &str = "user_id";

pub async fn current_user_id(session: &Session) -> Result<Option<i64>, session::Error> {
    session.get::<i64>(SESSION_USER_ID_KEY).await
}

/// Record `user_id` as the logged-in user.
pub async fn sign_in(session: &Session, user_id: i64) -> Result<(), session::Error> {
    session.insert(SESSION_USER_ID_KEY, user_id).await
}

pub async fn sign_out(session: &Session) -> Result<(), session::Error> {
    session.flush().await
}
