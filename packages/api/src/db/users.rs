use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::{ProfileUpdate, User};

const USER_COLUMNS: &str =
    "id, email, password_hash, name, age, phone, gender, address, created_at";

pub struct UserRepo;

impl UserRepo {
    /// Insert a user. A duplicate email fails with a unique violation, see
    /// [`is_unique_violation`].
    pub async fn create(
        pool: &SqlitePool,
        email: &str,
        password_hash: &str,
        name: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, name, created_at) VALUES (?, ?, ?, ?) RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn get_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Replace the profile fields and return the updated row.
    pub async fn update_profile(
        pool: &SqlitePool,
        id: i64,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET age = ?, phone = ?, gender = ?, address = ? WHERE id = ? RETURNING {USER_COLUMNS}"
        ))
        .bind(update.age)
        .bind(&update.phone)
        .bind(&update.gender)
        .bind(&update.address)
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}
