//! In-memory collaborators for tests.
//!
//! Compiled for this crate's own tests and, behind the `testing` feature,
//! for downstream crates that want to drive the domain services without a
//! database or network.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::clock::Clock;
use crate::comments::{Comment, Commenter, NewComment};
use crate::error::{CoreError, CoreResult};
use crate::ports::{
    CaptchaOutcome, CaptchaVerifier, CommentNotifier, CommentRepository, TextGenerator,
    UserRepository,
};
use crate::posts::PostSource;
use crate::types::{DbId, Timestamp};
use crate::users::UserProfile;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// MemoryDatabase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StoredComment {
    content: String,
    post_slug: String,
    commenter_id: DbId,
    created_at: Timestamp,
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<DbId, UserProfile>,
    comments: BTreeMap<DbId, StoredComment>,
    next_comment_id: DbId,
    fail_inserts: bool,
}

impl Tables {
    fn joined(&self, id: DbId, row: &StoredComment) -> CoreResult<Comment> {
        let user = self.users.get(&row.commenter_id).ok_or_else(|| {
            CoreError::Internal(format!(
                "comment {id} references missing user {}",
                row.commenter_id
            ))
        })?;
        Ok(Comment {
            id,
            content: row.content.clone(),
            post_slug: row.post_slug.clone(),
            commenter: Commenter {
                id: user.id,
                name: user.name.clone(),
                image: user.image.clone(),
            },
            created_at: row.created_at,
        })
    }

    fn get(&self, id: DbId) -> CoreResult<Option<Comment>> {
        self.comments
            .get(&id)
            .map(|row| self.joined(id, row))
            .transpose()
    }
}

/// Users and comments held in process memory. Implements both
/// repositories; `apply_translation` is atomic under one lock.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    tables: Mutex<Tables>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, id: DbId, name: &str, is_admin: bool, lang_token: i32) {
        lock(&self.tables).users.insert(
            id,
            UserProfile {
                id,
                name: Some(name.to_string()),
                image: None,
                is_admin,
                lang_token,
            },
        );
    }

    /// Insert a comment directly, bypassing validation. Returns its id.
    pub fn seed_comment(
        &self,
        commenter_id: DbId,
        post_slug: &str,
        content: &str,
        created_at: Timestamp,
    ) -> DbId {
        let mut tables = lock(&self.tables);
        tables.next_comment_id += 1;
        let id = tables.next_comment_id;
        tables.comments.insert(
            id,
            StoredComment {
                content: content.to_string(),
                post_slug: post_slug.to_string(),
                commenter_id,
                created_at,
            },
        );
        id
    }

    /// Make every subsequent insert fail with an internal error.
    pub fn fail_inserts(&self, fail: bool) {
        lock(&self.tables).fail_inserts = fail;
    }

    pub fn find(&self, id: DbId) -> Option<Comment> {
        lock(&self.tables).get(id).ok().flatten()
    }

    pub fn all_comments(&self) -> Vec<Comment> {
        let tables = lock(&self.tables);
        tables
            .comments
            .iter()
            .filter_map(|(id, row)| tables.joined(*id, row).ok())
            .collect()
    }

    pub fn lang_token_of(&self, user_id: DbId) -> Option<i32> {
        lock(&self.tables).users.get(&user_id).map(|u| u.lang_token)
    }
}

#[async_trait]
impl CommentRepository for MemoryDatabase {
    async fn list_for_post(&self, post_slug: &str) -> CoreResult<Vec<Comment>> {
        let tables = lock(&self.tables);
        tables
            .comments
            .iter()
            .filter(|(_, row)| row.post_slug == post_slug)
            .map(|(id, row)| tables.joined(*id, row))
            .collect()
    }

    async fn find_by_id(&self, id: DbId) -> CoreResult<Option<Comment>> {
        lock(&self.tables).get(id)
    }

    async fn count_between(
        &self,
        commenter_id: DbId,
        since: Timestamp,
        until: Timestamp,
    ) -> CoreResult<i64> {
        let count = lock(&self.tables)
            .comments
            .values()
            .filter(|row| {
                row.commenter_id == commenter_id
                    && row.created_at >= since
                    && row.created_at <= until
            })
            .count();
        Ok(count as i64)
    }

    async fn insert(&self, comment: &NewComment) -> CoreResult<Comment> {
        let mut tables = lock(&self.tables);
        if tables.fail_inserts {
            return Err(CoreError::Internal("insert failed".into()));
        }
        if !tables.users.contains_key(&comment.commenter_id) {
            return Err(CoreError::Internal(format!(
                "unknown commenter {}",
                comment.commenter_id
            )));
        }
        tables.next_comment_id += 1;
        let id = tables.next_comment_id;
        let row = StoredComment {
            content: comment.content.clone(),
            post_slug: comment.post_slug.clone(),
            commenter_id: comment.commenter_id,
            created_at: comment.created_at,
        };
        let joined = tables.joined(id, &row)?;
        tables.comments.insert(id, row);
        Ok(joined)
    }

    async fn update_content(&self, id: DbId, content: &str) -> CoreResult<Option<Comment>> {
        let mut tables = lock(&self.tables);
        match tables.comments.get_mut(&id) {
            Some(row) => row.content = content.to_string(),
            None => return Ok(None),
        }
        tables.get(id)
    }

    async fn delete(&self, id: DbId) -> CoreResult<bool> {
        Ok(lock(&self.tables).comments.remove(&id).is_some())
    }

    async fn apply_translation(
        &self,
        id: DbId,
        user_id: DbId,
        content: &str,
    ) -> CoreResult<Option<Comment>> {
        let mut tables = lock(&self.tables);
        let has_tokens = tables.users.get(&user_id).is_some_and(|u| u.lang_token > 0);
        if !has_tokens || !tables.comments.contains_key(&id) {
            return Ok(None);
        }
        if let Some(user) = tables.users.get_mut(&user_id) {
            user.lang_token -= 1;
        }
        if let Some(row) = tables.comments.get_mut(&id) {
            row.content = content.to_string();
        }
        tables.get(id)
    }
}

#[async_trait]
impl UserRepository for MemoryDatabase {
    async fn find_by_id(&self, id: DbId) -> CoreResult<Option<UserProfile>> {
        Ok(lock(&self.tables).users.get(&id).cloned())
    }

    async fn lang_tokens(&self, id: DbId) -> CoreResult<Option<i32>> {
        Ok(self.lang_token_of(id))
    }
}

// ---------------------------------------------------------------------------
// ManualClock
// ---------------------------------------------------------------------------

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        *lock(&self.now) += by;
    }

    pub fn set(&self, to: Timestamp) {
        *lock(&self.now) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *lock(&self.now)
    }
}

// ---------------------------------------------------------------------------
// StaticCaptcha
// ---------------------------------------------------------------------------

/// Answers every verification the same way and counts calls.
#[derive(Debug)]
pub struct StaticCaptcha {
    success: bool,
    calls: AtomicUsize,
}

impl StaticCaptcha {
    pub fn new(success: bool) -> Self {
        Self {
            success,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptchaVerifier for StaticCaptcha {
    async fn verify(&self, _token: &str) -> CoreResult<CaptchaOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CaptchaOutcome {
            success: self.success,
            error_codes: if self.success {
                Vec::new()
            } else {
                vec!["invalid-input-response".to_string()]
            },
        })
    }
}

// ---------------------------------------------------------------------------
// ScriptedGenerator
// ---------------------------------------------------------------------------

/// Returns a fixed reply (or error), optionally after a delay, and records
/// every prompt it receives.
#[derive(Debug)]
pub struct ScriptedGenerator {
    reply: Result<String, String>,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        lock(&self.prompts).len()
    }

    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> CoreResult<String> {
        lock(&self.prompts).push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone().map_err(CoreError::Internal)
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

/// Records notified comment ids; optionally fails every call.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    fail: bool,
    notified: Mutex<Vec<DbId>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            notified: Mutex::new(Vec::new()),
        }
    }

    pub fn notified(&self) -> Vec<DbId> {
        lock(&self.notified).clone()
    }
}

impl CommentNotifier for RecordingNotifier {
    fn comment_created(&self, comment: &Comment) -> CoreResult<()> {
        if self.fail {
            return Err(CoreError::Internal("notification channel closed".into()));
        }
        lock(&self.notified).push(comment.id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryPostSource
// ---------------------------------------------------------------------------

/// Post files held in memory, with a read counter for cache assertions.
#[derive(Debug, Default)]
pub struct MemoryPostSource {
    files: Mutex<BTreeMap<String, String>>,
    reads: AtomicUsize,
    fail_listing: Mutex<bool>,
}

impl MemoryPostSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or overwrite a file by name, e.g. `"hello.md"`.
    pub fn add(&self, file_name: &str, contents: &str) {
        lock(&self.files).insert(file_name.to_string(), contents.to_string());
    }

    /// Number of `read` calls served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn fail_listing(&self, fail: bool) {
        *lock(&self.fail_listing) = fail;
    }
}

#[async_trait]
impl PostSource for MemoryPostSource {
    async fn list_files(&self) -> io::Result<Vec<String>> {
        if *lock(&self.fail_listing) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "posts directory missing"));
        }
        Ok(lock(&self.files).keys().cloned().collect())
    }

    fn resolve(&self, slug: &str) -> PathBuf {
        PathBuf::from(format!("{slug}.md"))
    }

    async fn read(&self, path: &Path) -> io::Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let name = path.to_string_lossy();
        lock(&self.files)
            .get(name.as_ref())
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{name} not found")))
    }
}
