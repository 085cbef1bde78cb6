//! The comment submission pipeline and its reduced edit/delete paths.
//!
//! Creation runs strictly in order, every step a terminal stop on failure:
//! CAPTCHA, authentication, shape validation, rate limit, content filter,
//! persist. Notification follows as a side effect whose failure is logged
//! and never surfaces. The insert is the only durable write, so a failed
//! request leaves nothing behind.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::comments::{
    validate_comment_content, validate_post_slug, Comment, CommentStore, NewComment,
};
use crate::content_filter::ContentFilter;
use crate::error::{CoreError, CoreResult};
use crate::ports::{CaptchaVerifier, CommentNotifier};
use crate::rate_limit::RateLimiter;
use crate::types::{DbId, Session};

/// Whether the process runs against real third parties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// CAPTCHA verification and admin email are skipped.
    Development,
    #[default]
    Production,
}

impl ExecutionMode {
    pub fn is_development(self) -> bool {
        self == ExecutionMode::Development
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(ExecutionMode::Development),
            "production" | "prod" => Ok(ExecutionMode::Production),
            other => Err(format!("Unknown execution mode: {other}")),
        }
    }
}

/// Steps of the creation pipeline, used to label log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CaptchaCheck,
    AuthCheck,
    ShapeValidation,
    RateLimitCheck,
    Filter,
    Persist,
    Notify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::CaptchaCheck => "captcha_check",
            Stage::AuthCheck => "auth_check",
            Stage::ShapeValidation => "shape_validation",
            Stage::RateLimitCheck => "rate_limit_check",
            Stage::Filter => "filter",
            Stage::Persist => "persist",
            Stage::Notify => "notify",
        };
        f.write_str(name)
    }
}

/// Client input for comment creation. Fields are optional so that missing
/// values fail shape validation instead of deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub post_slug: Option<String>,
    pub content: Option<String>,
    #[serde(alias = "token")]
    pub captcha_token: Option<String>,
}

pub struct ModerationPipeline {
    mode: ExecutionMode,
    captcha: Arc<dyn CaptchaVerifier>,
    limiter: RateLimiter,
    filter: ContentFilter,
    comments: CommentStore,
    notifier: Arc<dyn CommentNotifier>,
    clock: Arc<dyn Clock>,
}

impl ModerationPipeline {
    pub fn new(
        mode: ExecutionMode,
        captcha: Arc<dyn CaptchaVerifier>,
        limiter: RateLimiter,
        filter: ContentFilter,
        comments: CommentStore,
        notifier: Arc<dyn CommentNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            mode,
            captcha,
            limiter,
            filter,
            comments,
            notifier,
            clock,
        }
    }

    /// Run the full creation pipeline.
    pub async fn create_comment(
        &self,
        session: Option<&Session>,
        request: CreateCommentRequest,
    ) -> CoreResult<Comment> {
        self.check_captcha(request.captcha_token.as_deref()).await?;

        let session = session.ok_or_else(|| {
            rejected(
                Stage::AuthCheck,
                CoreError::Unauthorized("You must be logged in to comment".into()),
            )
        })?;

        let content = request
            .content
            .as_deref()
            .ok_or_else(|| "Comment must have content".to_string())
            .and_then(validate_comment_content)
            .map_err(|msg| rejected(Stage::ShapeValidation, CoreError::BadRequest(msg)))?;
        let post_slug = request
            .post_slug
            .as_deref()
            .ok_or_else(|| "Comment must have a post slug".to_string())
            .and_then(validate_post_slug)
            .map_err(|msg| rejected(Stage::ShapeValidation, CoreError::BadRequest(msg)))?;

        self.limiter
            .check_and_admit(session.user_id)
            .await
            .map_err(|e| rejected(Stage::RateLimitCheck, e))?;

        let cleaned = self.filter.clean(content);
        if cleaned != content {
            tracing::debug!(stage = %Stage::Filter, user_id = session.user_id, "Masked profanity");
        }

        let comment = self
            .comments
            .create(&NewComment {
                post_slug: post_slug.to_string(),
                content: cleaned,
                commenter_id: session.user_id,
                created_at: self.clock.now(),
            })
            .await
            .map_err(|e| {
                tracing::error!(stage = %Stage::Persist, error = %e, "Failed to persist comment");
                e
            })?;

        tracing::info!(
            comment_id = comment.id,
            user_id = session.user_id,
            post_slug = %comment.post_slug,
            "Comment created"
        );

        if let Err(e) = self.notifier.comment_created(&comment) {
            tracing::error!(
                stage = %Stage::Notify,
                comment_id = comment.id,
                error = %e,
                "Comment notification failed"
            );
        }

        Ok(comment)
    }

    /// Owner-only edit: ownership, shape validation, filter, update.
    pub async fn update_comment(
        &self,
        session: Option<&Session>,
        comment_id: DbId,
        content: &str,
    ) -> CoreResult<Comment> {
        let session = session
            .ok_or_else(|| CoreError::Unauthorized("You must be logged in to edit".into()))?;

        let existing = self.comments.get_by_id(comment_id).await?;
        if existing.commenter.id != session.user_id {
            return Err(CoreError::Unauthorized(
                "Only the author can edit this comment".into(),
            ));
        }

        let content = validate_comment_content(content).map_err(CoreError::BadRequest)?;
        let cleaned = self.filter.clean(content);
        let updated = self
            .comments
            .update(comment_id, &cleaned, session.user_id)
            .await?;

        tracing::info!(comment_id, user_id = session.user_id, "Comment updated");
        Ok(updated)
    }

    /// Owner-or-admin physical delete.
    pub async fn delete_comment(
        &self,
        session: Option<&Session>,
        comment_id: DbId,
    ) -> CoreResult<()> {
        let session = session
            .ok_or_else(|| CoreError::Unauthorized("You must be logged in to delete".into()))?;

        self.comments
            .delete(comment_id, session.user_id, session.is_admin)
            .await?;

        tracing::info!(
            comment_id,
            user_id = session.user_id,
            is_admin = session.is_admin,
            "Comment deleted"
        );
        Ok(())
    }

    async fn check_captcha(&self, token: Option<&str>) -> CoreResult<()> {
        if self.mode.is_development() {
            tracing::debug!("CAPTCHA verification skipped in development");
            return Ok(());
        }

        let failed = || {
            rejected(
                Stage::CaptchaCheck,
                CoreError::BadRequest("recaptcha failed".into()),
            )
        };

        let token = token.map(str::trim).filter(|t| !t.is_empty()).ok_or_else(failed)?;
        match self.captcha.verify(token).await {
            Ok(outcome) if outcome.success => Ok(()),
            Ok(outcome) => {
                tracing::warn!(error_codes = ?outcome.error_codes, "CAPTCHA rejected");
                Err(failed())
            }
            Err(e) => {
                tracing::warn!(error = %e, "CAPTCHA verification errored");
                Err(failed())
            }
        }
    }
}

fn rejected(stage: Stage, err: CoreError) -> CoreError {
    tracing::debug!(stage = %stage, error = %err, "Comment rejected");
    err
}
