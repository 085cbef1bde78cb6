//! User model.

use quill_core::types::{DbId, Timestamp};
use quill_core::users::UserProfile;
use serde::Deserialize;
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
    pub is_admin: bool,
    pub lang_token: i32,
    pub created_at: Timestamp,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        UserProfile {
            id: user.id,
            name: user.name,
            image: user.image,
            is_admin: user.is_admin,
            lang_token: user.lang_token,
        }
    }
}

/// DTO for provisioning a user (seeding and tests).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    pub lang_token: Option<i32>,
}
