//! Token-gated LLM rewrite of a comment's content.
//!
//! The requester's balance is checked before generation and spent only
//! after generation succeeds, in the same storage transaction that replaces
//! the comment text. A timeout or generation error leaves both untouched.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::comments::{Comment, CommentStore, MAX_COMMENT_LENGTH, MIN_COMMENT_LENGTH};
use crate::content_filter::ContentFilter;
use crate::error::{CoreError, CoreResult};
use crate::ports::{TextGenerator, UserRepository};
use crate::posts::PostStore;
use crate::types::{DbId, Session};

/// Default upper bound on one generation call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 25;

/// System message sent ahead of every rewrite prompt.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that translates a comment into another language or format as instructed.";

/// Intellegizer output cap stated in its prompt.
const INTELLEGIZER_MAX_CHARS: usize = 1000;

// ---------------------------------------------------------------------------
// Case types
// ---------------------------------------------------------------------------

/// Requested transformation. `None` only re-filters and is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationCase {
    None,
    Spanish,
    German,
    Bruh,
    Intellegizer,
}

impl TranslationCase {
    pub fn as_str(self) -> &'static str {
        match self {
            TranslationCase::None => "none",
            TranslationCase::Spanish => "spanish",
            TranslationCase::German => "german",
            TranslationCase::Bruh => "bruh",
            TranslationCase::Intellegizer => "intellegizer",
        }
    }

    /// The paid rewrite this case maps to, if any.
    pub fn rewrite_mode(self) -> Option<RewriteMode> {
        match self {
            TranslationCase::None => None,
            TranslationCase::Spanish => Some(RewriteMode::Spanish),
            TranslationCase::German => Some(RewriteMode::German),
            TranslationCase::Bruh => Some(RewriteMode::Bruh),
            TranslationCase::Intellegizer => Some(RewriteMode::Intellegizer),
        }
    }
}

impl fmt::Display for TranslationCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TranslationCase {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(TranslationCase::None),
            "spanish" => Ok(TranslationCase::Spanish),
            "german" => Ok(TranslationCase::German),
            "bruh" => Ok(TranslationCase::Bruh),
            "intellegizer" => Ok(TranslationCase::Intellegizer),
            other => Err(CoreError::BadRequest(format!("Unknown case type: {other}"))),
        }
    }
}

/// A paid rewrite, each with its own prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteMode {
    Spanish,
    German,
    Bruh,
    Intellegizer,
}

impl RewriteMode {
    /// Whether the prompt embeds the post the comment belongs to.
    pub fn needs_post_context(self) -> bool {
        matches!(self, RewriteMode::Intellegizer)
    }

    /// Build the user prompt. Fails when post context is required but
    /// missing.
    pub fn build_prompt(self, comment: &str, post_content: Option<&str>) -> CoreResult<String> {
        let prompt = match self {
            RewriteMode::Spanish => slang_translation(comment, "Spanish"),
            RewriteMode::German => slang_translation(comment, "German"),
            RewriteMode::Bruh => format!(
                "CONTENT:\n{comment}\n===\n\
                 Please translate the CONTENT to tech bro speak.\n\
                 Use sentence openers like, \"So like\" \"Totally\" and others that you feel are appropriate.\n\
                 Every once on a while mention a guy named Chad and how sweet you think he is or what you think Chad would think about a point in the CONTENT.\n\
                 MAX character count: {}",
                comment.chars().count() * 2
            ),
            RewriteMode::Intellegizer => {
                let post = post_content.ok_or_else(|| {
                    CoreError::BadRequest("intellegizer case requires post content".into())
                })?;
                format!(
                    "CONTENT:\n{comment}\n===\nPOST CONTENT:\n{post}\n===\n\
                     Please elaborate on the text by adding fillers and attempting to make the text sound more intellegent based on the POST. \
                     Make one or two spelling errors and be sure to include one sentence that factually incorrect to the CONTENT. \
                     max characters {INTELLEGIZER_MAX_CHARS}"
                )
            }
        };
        Ok(prompt)
    }
}

fn slang_translation(comment: &str, language: &str) -> String {
    format!(
        "CONTENT:\n{comment}\n===\n\
         Please translate the above content to {language}. \
         Use relative terms and slang so that it is fermiliar to native speakers"
    )
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

pub struct TranslationWorkflow {
    comments: CommentStore,
    users: Arc<dyn UserRepository>,
    generator: Arc<dyn TextGenerator>,
    posts: Arc<PostStore>,
    filter: ContentFilter,
    timeout: Duration,
}

impl TranslationWorkflow {
    pub fn new(
        comments: CommentStore,
        users: Arc<dyn UserRepository>,
        generator: Arc<dyn TextGenerator>,
        posts: Arc<PostStore>,
        filter: ContentFilter,
        timeout: Duration,
    ) -> Self {
        Self {
            comments,
            users,
            generator,
            posts,
            filter,
            timeout,
        }
    }

    /// Rewrite comment `comment_id` as `case`, on behalf of its author.
    pub async fn translate(
        &self,
        session: Option<&Session>,
        comment_id: DbId,
        case: TranslationCase,
    ) -> CoreResult<Comment> {
        let session = session
            .ok_or_else(|| CoreError::Unauthorized("You must be signed in".into()))?;
        let comment = self.comments.get_by_id(comment_id).await?;

        // Admins get no override here, unlike delete.
        if comment.commenter.id != session.user_id {
            return Err(CoreError::BadRequest(
                "You are not the original commenter".into(),
            ));
        }

        let Some(mode) = case.rewrite_mode() else {
            let cleaned = self.filter.clean(&comment.content);
            return self
                .comments
                .update(comment_id, &cleaned, session.user_id)
                .await;
        };

        let balance = self.users.lang_tokens(session.user_id).await?;
        if balance.unwrap_or(0) <= 0 {
            return Err(CoreError::BadRequest("Not enough tokens".into()));
        }

        let post_content = if mode.needs_post_context() {
            let content = self.posts.content(&comment.post_slug).await.map_err(|e| {
                tracing::warn!(
                    post_slug = %comment.post_slug,
                    error = %e,
                    "Post context unavailable"
                );
                CoreError::BadRequest("Post content is unavailable for this comment".into())
            })?;
            Some(content)
        } else {
            None
        };

        let prompt = mode.build_prompt(&comment.content, post_content.as_deref())?;

        let generated = tokio::time::timeout(self.timeout, self.generator.generate(&prompt))
            .await
            .map_err(|_| {
                tracing::warn!(comment_id, case = %case, "Text generation timed out");
                CoreError::Timeout("Text generation timed out".into())
            })??;

        let content = self.sanitize(&generated)?;

        let updated = self
            .comments
            .replace_translated(comment_id, session.user_id, &content)
            .await?
            .ok_or_else(|| CoreError::BadRequest("Not enough tokens".into()))?;

        tracing::info!(comment_id, user_id = session.user_id, case = %case, "Comment translated");
        Ok(updated)
    }

    /// Filter, trim and cap generated text to the stored comment bounds.
    fn sanitize(&self, generated: &str) -> CoreResult<String> {
        let cleaned = self.filter.clean(generated);
        let trimmed = cleaned.trim();
        let capped: String = trimmed.chars().take(MAX_COMMENT_LENGTH).collect();
        let capped = capped.trim_end().to_string();

        if capped.chars().count() < MIN_COMMENT_LENGTH {
            return Err(CoreError::Internal(
                "Text generation returned no usable content".into(),
            ));
        }
        Ok(capped)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    use super::*;
    use crate::posts::PostCacheConfig;
    use crate::testing::{ManualClock, MemoryDatabase, MemoryPostSource, ScriptedGenerator};

    struct Fixture {
        db: Arc<MemoryDatabase>,
        generator: Arc<ScriptedGenerator>,
        workflow: TranslationWorkflow,
    }

    fn fixture(generator: ScriptedGenerator) -> Fixture {
        let db = Arc::new(MemoryDatabase::new());
        db.add_user(1, "Indy", false, 1);
        db.add_user(2, "Sassy", false, 0);
        db.add_user(9, "Admin", true, 5);

        let source = Arc::new(MemoryPostSource::new());
        source.add(
            "embracing-change.md",
            "---\ntitle: 'Embracing Change'\n---\nChange is the only constant.\n",
        );
        let clock = Arc::new(ManualClock::new(
            chrono::Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        ));
        let posts = Arc::new(PostStore::new(source, clock, PostCacheConfig::default()));

        let generator = Arc::new(generator);
        let workflow = TranslationWorkflow::new(
            CommentStore::new(db.clone()),
            db.clone(),
            generator.clone(),
            posts,
            ContentFilter::default(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        );
        Fixture {
            db,
            generator,
            workflow,
        }
    }

    fn session(user_id: DbId) -> Session {
        Session {
            user_id,
            is_admin: user_id == 9,
        }
    }

    fn seed(db: &MemoryDatabase, user_id: DbId, content: &str) -> DbId {
        db.seed_comment(
            user_id,
            "embracing-change",
            content,
            chrono::Utc.with_ymd_and_hms(2024, 3, 1, 11, 0, 0).unwrap(),
        )
    }

    // -- case parsing and prompts --------------------------------------------

    #[test]
    fn case_types_parse() {
        assert_eq!("spanish".parse::<TranslationCase>().unwrap(), TranslationCase::Spanish);
        assert_eq!("none".parse::<TranslationCase>().unwrap(), TranslationCase::None);
        assert_matches!("klingon".parse::<TranslationCase>(), Err(CoreError::BadRequest(_)));
    }

    #[test]
    fn bruh_prompt_caps_at_twice_input_length() {
        let prompt = RewriteMode::Bruh.build_prompt("hello", None).unwrap();
        assert!(prompt.starts_with("CONTENT:\nhello\n===\n"));
        assert!(prompt.ends_with("MAX character count: 10"));
    }

    #[test]
    fn intellegizer_prompt_requires_post() {
        assert_matches!(
            RewriteMode::Intellegizer.build_prompt("hi", None),
            Err(CoreError::BadRequest(_))
        );
        let prompt = RewriteMode::Intellegizer
            .build_prompt("hi", Some("the post"))
            .unwrap();
        assert!(prompt.contains("POST CONTENT:\nthe post\n===\n"));
        assert!(prompt.ends_with("max characters 1000"));
    }

    #[test]
    fn spanish_prompt_names_language() {
        let prompt = RewriteMode::Spanish.build_prompt("hi", None).unwrap();
        assert!(prompt.contains("translate the above content to Spanish."));
    }

    // -- translate -----------------------------------------------------------

    #[tokio::test]
    async fn spanish_spends_token_then_second_request_fails() {
        let f = fixture(ScriptedGenerator::replying("Hola, que onda"));
        let id = seed(&f.db, 1, "Hello there");

        let updated = f
            .workflow
            .translate(Some(&session(1)), id, TranslationCase::Spanish)
            .await
            .unwrap();
        assert_eq!(updated.content, "Hola, que onda");
        assert_eq!(f.db.lang_token_of(1), Some(0));

        let second = f
            .workflow
            .translate(Some(&session(1)), id, TranslationCase::German)
            .await;
        assert_matches!(second, Err(CoreError::BadRequest(_)));
        assert_eq!(f.generator.calls(), 1);
    }

    #[tokio::test]
    async fn none_case_refilters_without_charging() {
        let f = fixture(ScriptedGenerator::replying("unused"));
        let id = seed(&f.db, 1, "well shit");

        let updated = f
            .workflow
            .translate(Some(&session(1)), id, TranslationCase::None)
            .await
            .unwrap();
        assert_eq!(updated.content, "well ****");
        assert_eq!(f.db.lang_token_of(1), Some(1));
        assert_eq!(f.generator.calls(), 0);
    }

    #[tokio::test]
    async fn none_case_works_with_zero_balance() {
        let f = fixture(ScriptedGenerator::replying("unused"));
        let id = seed(&f.db, 2, "fine words");
        assert!(f
            .workflow
            .translate(Some(&session(2)), id, TranslationCase::None)
            .await
            .is_ok());
        assert_eq!(f.db.lang_token_of(2), Some(0));
    }

    #[tokio::test]
    async fn zero_balance_fails_without_generating() {
        let f = fixture(ScriptedGenerator::replying("unused"));
        let id = seed(&f.db, 2, "Hello there");

        let result = f
            .workflow
            .translate(Some(&session(2)), id, TranslationCase::Bruh)
            .await;
        assert_matches!(result, Err(CoreError::BadRequest(msg)) if msg == "Not enough tokens");
        assert_eq!(f.generator.calls(), 0);
        assert_eq!(f.db.lang_token_of(2), Some(0));
    }

    #[tokio::test]
    async fn non_owner_is_bad_request_even_for_admin() {
        let f = fixture(ScriptedGenerator::replying("x"));
        let id = seed(&f.db, 1, "Hello there");

        for requester in [2, 9] {
            assert_matches!(
                f.workflow
                    .translate(Some(&session(requester)), id, TranslationCase::Spanish)
                    .await,
                Err(CoreError::BadRequest(_))
            );
        }
        assert_eq!(f.generator.calls(), 0);
    }

    #[tokio::test]
    async fn anonymous_is_unauthorized() {
        let f = fixture(ScriptedGenerator::replying("x"));
        let id = seed(&f.db, 1, "Hello there");
        assert_matches!(
            f.workflow.translate(None, id, TranslationCase::Spanish).await,
            Err(CoreError::Unauthorized(_))
        );
    }

    #[tokio::test]
    async fn missing_comment_is_not_found() {
        let f = fixture(ScriptedGenerator::replying("x"));
        assert_matches!(
            f.workflow
                .translate(Some(&session(1)), 404, TranslationCase::Spanish)
                .await,
            Err(CoreError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn intellegizer_embeds_post_content() {
        let f = fixture(ScriptedGenerator::replying("Verily, change is constnat."));
        let id = seed(&f.db, 1, "Nice post");

        f.workflow
            .translate(Some(&session(1)), id, TranslationCase::Intellegizer)
            .await
            .unwrap();
        let prompts = f.generator.prompts();
        assert!(prompts[0].contains("Change is the only constant."));
    }

    #[tokio::test]
    async fn intellegizer_without_post_is_bad_request_and_free() {
        let f = fixture(ScriptedGenerator::replying("x"));
        let id = f.db.seed_comment(
            1,
            "orphaned-slug",
            "Nice post",
            chrono::Utc.with_ymd_and_hms(2024, 3, 1, 11, 0, 0).unwrap(),
        );

        assert_matches!(
            f.workflow
                .translate(Some(&session(1)), id, TranslationCase::Intellegizer)
                .await,
            Err(CoreError::BadRequest(_))
        );
        assert_eq!(f.db.lang_token_of(1), Some(1));
        assert_eq!(f.generator.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_leaves_balance_and_content_untouched() {
        let f = fixture(
            ScriptedGenerator::replying("too late").with_delay(Duration::from_secs(120)),
        );
        let id = seed(&f.db, 1, "Hello there");

        let result = f
            .workflow
            .translate(Some(&session(1)), id, TranslationCase::Spanish)
            .await;
        assert_matches!(result, Err(CoreError::Timeout(_)));
        assert_eq!(f.db.lang_token_of(1), Some(1));
        assert_eq!(
            f.workflow.comments.get_by_id(id).await.unwrap().content,
            "Hello there"
        );
    }

    #[tokio::test]
    async fn generator_error_leaves_balance_untouched() {
        let f = fixture(ScriptedGenerator::failing("upstream 502"));
        let id = seed(&f.db, 1, "Hello there");

        assert_matches!(
            f.workflow
                .translate(Some(&session(1)), id, TranslationCase::German)
                .await,
            Err(CoreError::Internal(_))
        );
        assert_eq!(f.db.lang_token_of(1), Some(1));
    }

    #[tokio::test]
    async fn output_is_filtered_and_capped() {
        let long = format!("  damn {}  ", "a".repeat(600));
        let f = fixture(ScriptedGenerator::replying(&long));
        let id = seed(&f.db, 1, "Hello there");

        let updated = f
            .workflow
            .translate(Some(&session(1)), id, TranslationCase::Bruh)
            .await
            .unwrap();
        assert!(updated.content.starts_with("**** aaa"));
        assert_eq!(updated.content.chars().count(), MAX_COMMENT_LENGTH);
    }

    #[tokio::test]
    async fn empty_output_is_internal_and_free() {
        let f = fixture(ScriptedGenerator::replying("   "));
        let id = seed(&f.db, 1, "Hello there");

        assert_matches!(
            f.workflow
                .translate(Some(&session(1)), id, TranslationCase::Spanish)
                .await,
            Err(CoreError::Internal(_))
        );
        assert_eq!(f.db.lang_token_of(1), Some(1));
    }
}
