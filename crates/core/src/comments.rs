//! Comment records, content validation, and the authorization-checked
//! [`CommentStore`].

use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::ports::CommentRepository;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minimum comment length in characters, after trimming.
pub const MIN_COMMENT_LENGTH: usize = 2;

/// Maximum comment length in characters, after trimming.
pub const MAX_COMMENT_LENGTH: usize = 500;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Public summary of the user who wrote a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commenter {
    pub id: DbId,
    pub name: Option<String>,
    pub image: Option<String>,
}

/// The public shape of a stored comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: DbId,
    pub content: String,
    pub post_slug: String,
    pub commenter: Commenter,
    pub created_at: Timestamp,
}

/// Insert payload. Content must already be validated and filtered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_slug: String,
    pub content: String,
    pub commenter_id: DbId,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Trim `content` and check its length bounds. Returns the trimmed slice.
pub fn validate_comment_content(content: &str) -> Result<&str, String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err("Comment content cannot be empty".to_string());
    }
    let len = trimmed.chars().count();
    if len < MIN_COMMENT_LENGTH {
        return Err(format!(
            "Comment must be at least {MIN_COMMENT_LENGTH} characters"
        ));
    }
    if len > MAX_COMMENT_LENGTH {
        return Err(format!(
            "Comment exceeds maximum length of {MAX_COMMENT_LENGTH} characters"
        ));
    }
    Ok(trimmed)
}

/// Validate a post slug supplied by a client.
pub fn validate_post_slug(slug: &str) -> Result<&str, String> {
    let trimmed = slug.trim();
    if trimmed.is_empty() {
        return Err("Post slug is required".to_string());
    }
    Ok(trimmed)
}

/// Human-readable age of a comment relative to `now`.
pub fn format_relative_time(created_at: Timestamp, now: Timestamp) -> String {
    let elapsed = now - created_at;
    if elapsed < Duration::minutes(5) {
        return "Just now.".to_string();
    }
    if elapsed < Duration::minutes(60) {
        return "A few minutes ago.".to_string();
    }
    match elapsed.num_hours() {
        1 => "1 hour ago.".to_string(),
        h @ 2..=23 => format!("{h} hours ago."),
        _ => created_at.format("%Y-%m-%d").to_string(),
    }
}

// ---------------------------------------------------------------------------
// CommentStore
// ---------------------------------------------------------------------------

/// Authoritative comment CRUD with row-level authorization.
#[derive(Clone)]
pub struct CommentStore {
    repo: Arc<dyn CommentRepository>,
}

impl CommentStore {
    pub fn new(repo: Arc<dyn CommentRepository>) -> Self {
        Self { repo }
    }

    /// Comments on a post, oldest first.
    pub async fn list_for_post(&self, post_slug: &str) -> CoreResult<Vec<Comment>> {
        let mut comments = self.repo.list_for_post(post_slug).await?;
        comments.sort_by_key(|c| (c.created_at, c.id));
        Ok(comments)
    }

    pub async fn get_by_id(&self, id: DbId) -> CoreResult<Comment> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Comment", id))
    }

    pub async fn count_by_commenter_between(
        &self,
        commenter_id: DbId,
        since: Timestamp,
        until: Timestamp,
    ) -> CoreResult<i64> {
        self.repo.count_between(commenter_id, since, until).await
    }

    /// Persist a validated, filtered comment.
    pub async fn create(&self, new: &NewComment) -> CoreResult<Comment> {
        self.repo.insert(new).await.map_err(|e| match e {
            CoreError::Internal(_) => e,
            other => CoreError::Internal(other.to_string()),
        })
    }

    /// Replace the content of a comment owned by `requester_id`.
    ///
    /// Admins get no override here.
    pub async fn update(
        &self,
        id: DbId,
        content: &str,
        requester_id: DbId,
    ) -> CoreResult<Comment> {
        let existing = self.get_by_id(id).await?;
        if existing.commenter.id != requester_id {
            return Err(CoreError::Unauthorized(
                "Only the author can edit this comment".into(),
            ));
        }
        self.repo
            .update_content(id, content)
            .await?
            .ok_or_else(|| CoreError::not_found("Comment", id))
    }

    /// Physically delete a comment. Allowed for its owner or any admin.
    pub async fn delete(
        &self,
        id: DbId,
        requester_id: DbId,
        requester_is_admin: bool,
    ) -> CoreResult<()> {
        let existing = self.get_by_id(id).await?;
        if !requester_is_admin && existing.commenter.id != requester_id {
            return Err(CoreError::Unauthorized(
                "Only the author or an admin can delete this comment".into(),
            ));
        }
        if !self.repo.delete(id).await? {
            return Err(CoreError::not_found("Comment", id));
        }
        Ok(())
    }

    /// Spend one token of `user_id` and store translated content in one step.
    pub(crate) async fn replace_translated(
        &self,
        id: DbId,
        user_id: DbId,
        content: &str,
    ) -> CoreResult<Option<Comment>> {
        self.repo.apply_translation(id, user_id, content).await
    }
}
