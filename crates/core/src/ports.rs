//! Collaborator traits the domain services depend on.
//!
//! Each trait is a seam: `quill-db` implements the repositories over
//! PostgreSQL, `quill-api` implements CAPTCHA and text generation over HTTP,
//! and `quill-events` implements notification over the event bus. The
//! `testing` feature provides in-memory versions of all of them.

use async_trait::async_trait;

use crate::comments::{Comment, NewComment};
use crate::error::CoreResult;
use crate::types::{DbId, Timestamp};
use crate::users::UserProfile;

/// Durable comment storage. Every returned [`Comment`] is joined with its
/// commenter's public profile.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Comments on `post_slug`, oldest first.
    async fn list_for_post(&self, post_slug: &str) -> CoreResult<Vec<Comment>>;

    async fn find_by_id(&self, id: DbId) -> CoreResult<Option<Comment>>;

    /// Number of comments by `commenter_id` created in `[since, until]`.
    async fn count_between(
        &self,
        commenter_id: DbId,
        since: Timestamp,
        until: Timestamp,
    ) -> CoreResult<i64>;

    async fn insert(&self, comment: &NewComment) -> CoreResult<Comment>;

    /// Replace a comment's content. `None` when the row no longer exists.
    async fn update_content(&self, id: DbId, content: &str) -> CoreResult<Option<Comment>>;

    /// Physically delete a comment. Returns whether a row was removed.
    async fn delete(&self, id: DbId) -> CoreResult<bool>;

    /// Atomically spend one translation token of `user_id` and replace the
    /// comment content. Returns `None`, with nothing changed, when the
    /// balance is already zero or the comment is gone.
    async fn apply_translation(
        &self,
        id: DbId,
        user_id: DbId,
        content: &str,
    ) -> CoreResult<Option<Comment>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: DbId) -> CoreResult<Option<UserProfile>>;

    /// Current translation balance, `None` for an unknown user.
    async fn lang_tokens(&self, id: DbId) -> CoreResult<Option<i32>>;
}

/// Result of a CAPTCHA verification round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptchaOutcome {
    pub success: bool,
    pub error_codes: Vec<String>,
}

#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> CoreResult<CaptchaOutcome>;
}

/// External text-generation service. Only the final string is needed.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> CoreResult<String>;
}

/// Fire-and-forget notification about new comments.
///
/// Implementations must not block on delivery; the pipeline logs and
/// discards any error returned here.
pub trait CommentNotifier: Send + Sync {
    fn comment_created(&self, comment: &Comment) -> CoreResult<()>;
}
