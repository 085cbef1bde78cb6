//! Repository for the `comments` table.

use sqlx::PgPool;
use quill_core::types::{DbId, Timestamp};

use crate::models::comment::CommentRow;

/// Columns of a comment joined with its commenter. Expects the comment
/// relation aliased `c` and the user relation aliased `u`.
const JOINED_COLUMNS: &str = "c.id, c.content, c.post_slug, c.created_at, \
    u.id AS commenter_id, u.name AS commenter_name, u.image AS commenter_image";

/// Provides CRUD operations for comments.
pub struct CommentRepo;

impl CommentRepo {
    /// Insert a comment, returning it joined with its commenter.
    pub async fn create(
        pool: &PgPool,
        post_slug: &str,
        content: &str,
        commenter_id: DbId,
        created_at: Timestamp,
    ) -> Result<CommentRow, sqlx::Error> {
        let query = format!(
            "WITH c AS (
                INSERT INTO comments (content, post_slug, commenter_id, created_at)
                VALUES ($1, $2, $3, $4)
                RETURNING id, content, post_slug, commenter_id, created_at
             )
             SELECT {JOINED_COLUMNS} FROM c JOIN users u ON u.id = c.commenter_id"
        );
        sqlx::query_as::<_, CommentRow>(&query)
            .bind(content)
            .bind(post_slug)
            .bind(commenter_id)
            .bind(created_at)
            .fetch_one(pool)
            .await
    }

    /// Find a comment by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<CommentRow>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM comments c
             JOIN users u ON u.id = c.commenter_id
             WHERE c.id = $1"
        );
        sqlx::query_as::<_, CommentRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List comments on a post, oldest first.
    pub async fn list_for_post(
        pool: &PgPool,
        post_slug: &str,
    ) -> Result<Vec<CommentRow>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM comments c
             JOIN users u ON u.id = c.commenter_id
             WHERE c.post_slug = $1
             ORDER BY c.created_at ASC, c.id ASC"
        );
        sqlx::query_as::<_, CommentRow>(&query)
            .bind(post_slug)
            .fetch_all(pool)
            .await
    }

    /// Count a commenter's comments created in `[since, until]`.
    pub async fn count_between(
        pool: &PgPool,
        commenter_id: DbId,
        since: Timestamp,
        until: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM comments
             WHERE commenter_id = $1 AND created_at >= $2 AND created_at <= $3",
        )
        .bind(commenter_id)
        .bind(since)
        .bind(until)
        .fetch_one(pool)
        .await
    }

    /// Replace a comment's content, returning the updated row.
    pub async fn update_content(
        pool: &PgPool,
        id: DbId,
        content: &str,
    ) -> Result<Option<CommentRow>, sqlx::Error> {
        let query = format!(
            "WITH c AS (
                UPDATE comments SET content = $2
                WHERE id = $1
                RETURNING id, content, post_slug, commenter_id, created_at
             )
             SELECT {JOINED_COLUMNS} FROM c JOIN users u ON u.id = c.commenter_id"
        );
        sqlx::query_as::<_, CommentRow>(&query)
            .bind(id)
            .bind(content)
            .fetch_optional(pool)
            .await
    }

    /// Delete a comment by ID. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Spend one of `user_id`'s translation tokens and replace the content
    /// of a comment they own, in a single transaction.
    ///
    /// Returns `None` with nothing changed when the balance is zero or the
    /// comment does not exist or belongs to someone else.
    pub async fn apply_translation(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        content: &str,
    ) -> Result<Option<CommentRow>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let spent = sqlx::query(
            "UPDATE users SET lang_token = lang_token - 1 WHERE id = $1 AND lang_token > 0",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if spent.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let query = format!(
            "WITH c AS (
                UPDATE comments SET content = $2
                WHERE id = $1 AND commenter_id = $3
                RETURNING id, content, post_slug, commenter_id, created_at
             )
             SELECT {JOINED_COLUMNS} FROM c JOIN users u ON u.id = c.commenter_id"
        );
        let updated = sqlx::query_as::<_, CommentRow>(&query)
            .bind(id)
            .bind(content)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

        match updated {
            Some(row) => {
                tx.commit().await?;
                Ok(Some(row))
            }
            None => {
                tx.rollback().await?;
                Ok(None)
            }
        }
    }
}
