//! `quill-core` port implementations over PostgreSQL.

use async_trait::async_trait;
use quill_core::comments::{Comment, NewComment};
use quill_core::error::{CoreError, CoreResult};
use quill_core::ports::{CommentRepository, UserRepository};
use quill_core::types::{DbId, Timestamp};
use quill_core::users::UserProfile;

use crate::repositories::{CommentRepo, UserRepo};
use crate::DbPool;

/// Log a database error and hide its details behind an internal error.
fn internal(operation: &'static str) -> impl FnOnce(sqlx::Error) -> CoreError {
    move |err| {
        tracing::error!(operation, error = %err, "Database error");
        CoreError::Internal(format!("database error during {operation}"))
    }
}

#[derive(Clone)]
pub struct PgCommentRepository {
    pool: DbPool,
}

impl PgCommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn list_for_post(&self, post_slug: &str) -> CoreResult<Vec<Comment>> {
        let rows = CommentRepo::list_for_post(&self.pool, post_slug)
            .await
            .map_err(internal("list_for_post"))?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn find_by_id(&self, id: DbId) -> CoreResult<Option<Comment>> {
        let row = CommentRepo::find_by_id(&self.pool, id)
            .await
            .map_err(internal("find_comment"))?;
        Ok(row.map(Comment::from))
    }

    async fn count_between(
        &self,
        commenter_id: DbId,
        since: Timestamp,
        until: Timestamp,
    ) -> CoreResult<i64> {
        CommentRepo::count_between(&self.pool, commenter_id, since, until)
            .await
            .map_err(internal("count_recent_comments"))
    }

    async fn insert(&self, comment: &NewComment) -> CoreResult<Comment> {
        let row = CommentRepo::create(
            &self.pool,
            &comment.post_slug,
            &comment.content,
            comment.commenter_id,
            comment.created_at,
        )
        .await
        .map_err(internal("insert_comment"))?;
        Ok(row.into())
    }

    async fn update_content(&self, id: DbId, content: &str) -> CoreResult<Option<Comment>> {
        let row = CommentRepo::update_content(&self.pool, id, content)
            .await
            .map_err(internal("update_comment"))?;
        Ok(row.map(Comment::from))
    }

    async fn delete(&self, id: DbId) -> CoreResult<bool> {
        CommentRepo::delete(&self.pool, id)
            .await
            .map_err(internal("delete_comment"))
    }

    async fn apply_translation(
        &self,
        id: DbId,
        user_id: DbId,
        content: &str,
    ) -> CoreResult<Option<Comment>> {
        let row = CommentRepo::apply_translation(&self.pool, id, user_id, content)
            .await
            .map_err(internal("apply_translation"))?;
        Ok(row.map(Comment::from))
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: DbPool,
}

impl PgUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: DbId) -> CoreResult<Option<UserProfile>> {
        let user = UserRepo::find_by_id(&self.pool, id)
            .await
            .map_err(internal("find_user"))?;
        Ok(user.map(UserProfile::from))
    }

    async fn lang_tokens(&self, id: DbId) -> CoreResult<Option<i32>> {
        UserRepo::lang_tokens(&self.pool, id)
            .await
            .map_err(internal("lang_tokens"))
    }
}
