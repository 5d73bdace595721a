//! # User model for registered accounts
//!
//! Defines the two representations of a MediScan user:
//!
//! ## [`User`]
//!
//! The complete row from the `users` table, loaded with [`sqlx::FromRow`]:
//!
//! - `id`: integer primary key.
//! - `email`: unique, stored trimmed and lowercased.
//! - `password_hash`: Argon2id PHC string.
//! - `name`: display name; defaults to the local part of the email.
//! - `age`, `phone`, `gender`, `address`: optional profile fields edited
//!   through `/api/profile`.
//! - `created_at`: registration time.
//!
//! ## [`UserInfo`]
//!
//! What the API returns to clients: everything except the password hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user record from the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub age: Option<i64>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Convert to UserInfo for client consumption.
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            age: self.age,
            phone: self.phone.clone(),
            gender: self.gender.clone(),
            address: self.address.clone(),
            created_at: self.created_at,
        }
    }
}

/// User information safe to send to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub age: Option<i64>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Editable profile fields. Every field is replaced; `None` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl ProfileUpdate {
    /// Trim text fields and turn blank ones into `None`.
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            age: self.age,
            phone: clean(self.phone),
            gender: clean(self.gender),
            address: clean(self.address),
        }
    }
}
