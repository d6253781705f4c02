use chrono::{DateTime, Utc};
use serde::Serialize;

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
}

/// Input for inserting a user. The email must already be normalized and the
/// password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl NewUser {
    pub fn regular(email: String, password_hash: String) -> Self {
        Self {
            email,
            password_hash,
            is_active: true,
            is_staff: false,
            is_superuser: false,
        }
    }
}
