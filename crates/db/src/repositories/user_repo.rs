//! Repository for the `users` table.

use sqlx::PgPool;
use quill_core::types::DbId;

use crate::models::user::{CreateUser, User};

/// Column list for users queries.
const COLUMNS: &str = "id, name, email, image, is_admin, lang_token, created_at";

/// Balance granted when a user is provisioned without an explicit one.
pub const DEFAULT_LANG_TOKENS: i32 = 5;

/// Provides read access to users, plus provisioning for seeds and tests.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, email, image, is_admin, lang_token)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.image)
            .bind(input.is_admin)
            .bind(input.lang_token.unwrap_or(DEFAULT_LANG_TOKENS))
            .fetch_one(pool)
            .await
    }

    /// Find a user by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Current translation balance, `None` for an unknown user.
    pub async fn lang_tokens(pool: &PgPool, id: DbId) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar::<_, i32>("SELECT lang_token FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
