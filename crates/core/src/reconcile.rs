//! Optimistic client-side comment list.
//!
//! A mutation is applied to the local list immediately and the reconciler
//! enters [`SyncState::Pending`]. The server's answer either commits the
//! local change or rolls it back exactly. Only one mutation may be in
//! flight at a time.
//!
//! Provisional entries are tracked by a [`TempId`] that is deliberately not
//! serializable: it never leaves the client.

use uuid::Uuid;

use crate::comments::{Comment, Commenter};
use crate::moderation::CreateCommentRequest;
use crate::types::{DbId, Timestamp};

/// Client-only handle for a provisional comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TempId(Uuid);

impl TempId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// A locally synthesized comment awaiting server confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionalComment {
    pub temp_id: TempId,
    pub post_slug: String,
    pub content: String,
    pub commenter: Commenter,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Confirmed(Comment),
    Provisional(ProvisionalComment),
}

impl Entry {
    pub fn content(&self) -> &str {
        match self {
            Entry::Confirmed(c) => &c.content,
            Entry::Provisional(p) => &p.content,
        }
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, Entry::Provisional(_))
    }

    fn confirmed_id(&self) -> Option<DbId> {
        match self {
            Entry::Confirmed(c) => Some(c.id),
            Entry::Provisional(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Pending,
    Committed,
    RolledBack { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("another change is still in flight")]
    Busy,
    #[error("comment {0} is not in the local list")]
    UnknownComment(DbId),
    #[error("no change is in flight")]
    NothingPending,
}

/// What to undo if the in-flight mutation fails.
#[derive(Debug, Clone)]
enum PendingMutation {
    Create { temp_id: TempId },
    Edit { id: DbId, previous_content: String },
    Delete { position: usize, removed: Comment },
}

/// A new comment ready to send. `request` carries no trace of `temp_id`.
#[derive(Debug, Clone)]
pub struct Submission {
    pub temp_id: TempId,
    pub request: CreateCommentRequest,
}

#[derive(Debug)]
pub struct ClientReconciler {
    entries: Vec<Entry>,
    state: SyncState,
    pending: Option<PendingMutation>,
}

impl ClientReconciler {
    /// Start from an authoritative list.
    pub fn new(comments: Vec<Comment>) -> Self {
        Self {
            entries: comments.into_iter().map(Entry::Confirmed).collect(),
            state: SyncState::Idle,
            pending: None,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Append a provisional comment and build the request to send.
    pub fn begin_create(
        &mut self,
        commenter: Commenter,
        post_slug: &str,
        content: &str,
        captcha_token: Option<String>,
        now: Timestamp,
    ) -> Result<Submission, ReconcileError> {
        self.ensure_idle()?;

        let temp_id = TempId::new();
        self.entries.push(Entry::Provisional(ProvisionalComment {
            temp_id,
            post_slug: post_slug.to_string(),
            content: content.to_string(),
            commenter,
            created_at: now,
        }));
        self.start(PendingMutation::Create { temp_id });

        Ok(Submission {
            temp_id,
            request: CreateCommentRequest {
                post_slug: Some(post_slug.to_string()),
                content: Some(content.to_string()),
                captcha_token,
            },
        })
    }

    /// Replace a confirmed comment's content locally.
    pub fn begin_edit(&mut self, id: DbId, content: &str) -> Result<(), ReconcileError> {
        self.ensure_idle()?;

        let entry = self
            .entries
            .iter_mut()
            .find_map(|e| match e {
                Entry::Confirmed(c) if c.id == id => Some(c),
                _ => None,
            })
            .ok_or(ReconcileError::UnknownComment(id))?;

        let previous_content = std::mem::replace(&mut entry.content, content.to_string());
        self.start(PendingMutation::Edit {
            id,
            previous_content,
        });
        Ok(())
    }

    /// Remove a confirmed comment locally.
    pub fn begin_delete(&mut self, id: DbId) -> Result<(), ReconcileError> {
        self.ensure_idle()?;

        let (position, removed) = self
            .entries
            .iter()
            .enumerate()
            .find_map(|(i, e)| match e {
                Entry::Confirmed(c) if c.id == id => Some((i, c.clone())),
                _ => None,
            })
            .ok_or(ReconcileError::UnknownComment(id))?;

        self.entries.remove(position);
        self.start(PendingMutation::Delete { position, removed });
        Ok(())
    }

    /// The server accepted the in-flight change. `confirmed` is the
    /// server's copy of the created or edited comment, when it returned one.
    /// A create settled without a copy drops its provisional entry and
    /// waits for [`ClientReconciler::refresh`].
    pub fn settle_success(&mut self, confirmed: Option<Comment>) -> Result<(), ReconcileError> {
        let pending = self.pending.take().ok_or(ReconcileError::NothingPending)?;

        match pending {
            PendingMutation::Create { temp_id } => {
                let position = self.provisional_position(temp_id);
                match (position, confirmed) {
                    (Some(i), Some(comment)) => self.entries[i] = Entry::Confirmed(comment),
                    (Some(i), None) => {
                        self.entries.remove(i);
                    }
                    (None, Some(comment)) => self.entries.push(Entry::Confirmed(comment)),
                    (None, None) => {}
                }
            }
            PendingMutation::Edit { id, .. } => {
                if let Some(comment) = confirmed {
                    if let Some(slot) = self
                        .entries
                        .iter_mut()
                        .find(|e| e.confirmed_id() == Some(id))
                    {
                        *slot = Entry::Confirmed(comment);
                    }
                }
            }
            PendingMutation::Delete { .. } => {}
        }

        self.state = SyncState::Committed;
        Ok(())
    }

    /// The server rejected the in-flight change. The local list returns to
    /// exactly what it was before the change began.
    pub fn settle_failure(&mut self, error: impl Into<String>) -> Result<(), ReconcileError> {
        let pending = self.pending.take().ok_or(ReconcileError::NothingPending)?;

        match pending {
            PendingMutation::Create { temp_id } => {
                if let Some(i) = self.provisional_position(temp_id) {
                    self.entries.remove(i);
                }
            }
            PendingMutation::Edit {
                id,
                previous_content,
            } => {
                for entry in &mut self.entries {
                    if let Entry::Confirmed(c) = entry {
                        if c.id == id {
                            c.content = previous_content;
                            break;
                        }
                    }
                }
            }
            PendingMutation::Delete { position, removed } => {
                let position = position.min(self.entries.len());
                self.entries.insert(position, Entry::Confirmed(removed));
            }
        }

        self.state = SyncState::RolledBack {
            error: error.into(),
        };
        Ok(())
    }

    /// Replace the local list with the server's. Refused while a change is
    /// in flight, since rollback would then have nothing to restore into.
    pub fn refresh(&mut self, comments: Vec<Comment>) -> Result<(), ReconcileError> {
        self.ensure_idle()?;
        self.entries = comments.into_iter().map(Entry::Confirmed).collect();
        self.state = SyncState::Idle;
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), ReconcileError> {
        if self.pending.is_some() {
            return Err(ReconcileError::Busy);
        }
        Ok(())
    }

    fn start(&mut self, mutation: PendingMutation) {
        self.pending = Some(mutation);
        self.state = SyncState::Pending;
    }

    fn provisional_position(&self, temp_id: TempId) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| matches!(e, Entry::Provisional(p) if p.temp_id == temp_id))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    use super::*;

    fn at(minute: u32) -> Timestamp {
        chrono::Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0).unwrap()
    }

    fn commenter(id: DbId) -> Commenter {
        Commenter {
            id,
            name: Some(format!("user-{id}")),
            image: None,
        }
    }

    fn comment(id: DbId, content: &str) -> Comment {
        Comment {
            id,
            content: content.into(),
            post_slug: "embracing-change".into(),
            commenter: commenter(1),
            created_at: at(id as u32),
        }
    }

    fn contents(r: &ClientReconciler) -> Vec<&str> {
        r.entries().iter().map(Entry::content).collect()
    }

    #[test]
    fn create_appends_provisional_then_commits() {
        let mut r = ClientReconciler::new(vec![comment(1, "first")]);
        let submission = r
            .begin_create(commenter(1), "embracing-change", "Hi", Some("tok".into()), at(5))
            .unwrap();
        assert_eq!(r.state(), &SyncState::Pending);
        assert!(r.entries()[1].is_provisional());

        r.settle_success(Some(comment(7, "Hi"))).unwrap();
        assert_eq!(r.state(), &SyncState::Committed);
        assert_eq!(r.entries()[1], Entry::Confirmed(comment(7, "Hi")));
        assert!(r.provisional_position(submission.temp_id).is_none());
    }

    #[test]
    fn create_failure_removes_only_the_provisional_entry() {
        let mut r = ClientReconciler::new(vec![comment(1, "first"), comment(2, "second")]);
        r.begin_create(commenter(1), "embracing-change", "Hi", None, at(5))
            .unwrap();

        r.settle_failure("You're doing that too much.").unwrap();
        assert_eq!(contents(&r), vec!["first", "second"]);
        assert_matches!(r.state(), SyncState::RolledBack { error } if error.contains("too much"));
    }

    #[test]
    fn temp_id_is_not_part_of_the_request() {
        let mut r = ClientReconciler::new(vec![]);
        let submission = r
            .begin_create(commenter(1), "embracing-change", "Hi", Some("tok".into()), at(5))
            .unwrap();

        let body = serde_json::to_string(&submission.request).unwrap();
        assert!(!body.contains(&submission.temp_id.0.to_string()));
        assert!(body.contains("\"postSlug\":\"embracing-change\""));
    }

    #[test]
    fn success_without_copy_awaits_refresh() {
        let mut r = ClientReconciler::new(vec![comment(1, "first")]);
        r.begin_create(commenter(1), "embracing-change", "Hi", None, at(5))
            .unwrap();
        r.settle_success(None).unwrap();
        assert_eq!(contents(&r), vec!["first"]);

        r.refresh(vec![comment(1, "first"), comment(3, "Hi")]).unwrap();
        assert_eq!(contents(&r), vec!["first", "Hi"]);
        assert_eq!(r.state(), &SyncState::Idle);
    }

    #[test]
    fn only_one_change_in_flight() {
        let mut r = ClientReconciler::new(vec![comment(1, "first")]);
        r.begin_create(commenter(1), "p", "Hi", None, at(5)).unwrap();
        assert_eq!(
            r.begin_create(commenter(1), "p", "Again", None, at(5)).unwrap_err(),
            ReconcileError::Busy
        );
        assert_eq!(r.begin_delete(1), Err(ReconcileError::Busy));
        assert_eq!(r.refresh(vec![]), Err(ReconcileError::Busy));
    }

    #[test]
    fn settling_without_pending_change_is_an_error() {
        let mut r = ClientReconciler::new(vec![]);
        assert_eq!(r.settle_success(None), Err(ReconcileError::NothingPending));
        assert_eq!(r.settle_failure("x"), Err(ReconcileError::NothingPending));
    }

    #[test]
    fn edit_rollback_restores_previous_content() {
        let mut r = ClientReconciler::new(vec![comment(1, "first"), comment(2, "second")]);
        r.begin_edit(2, "edited").unwrap();
        assert_eq!(contents(&r), vec!["first", "edited"]);

        r.settle_failure("Unauthorized").unwrap();
        assert_eq!(contents(&r), vec!["first", "second"]);
    }

    #[test]
    fn edit_commit_takes_server_copy() {
        let mut r = ClientReconciler::new(vec![comment(1, "first")]);
        r.begin_edit(1, "damn edit").unwrap();
        r.settle_success(Some(comment(1, "**** edit"))).unwrap();
        assert_eq!(contents(&r), vec!["**** edit"]);
    }

    #[test]
    fn delete_rollback_restores_original_position() {
        let mut r = ClientReconciler::new(vec![
            comment(1, "first"),
            comment(2, "second"),
            comment(3, "third"),
        ]);
        r.begin_delete(2).unwrap();
        assert_eq!(contents(&r), vec!["first", "third"]);

        r.settle_failure("Unauthorized").unwrap();
        assert_eq!(contents(&r), vec!["first", "second", "third"]);
    }

    #[test]
    fn delete_commit_keeps_removal() {
        let mut r = ClientReconciler::new(vec![comment(1, "first"), comment(2, "second")]);
        r.begin_delete(1).unwrap();
        r.settle_success(None).unwrap();
        assert_eq!(contents(&r), vec!["second"]);
    }

    #[test]
    fn unknown_comment_is_rejected_without_state_change() {
        let mut r = ClientReconciler::new(vec![comment(1, "first")]);
        assert_eq!(r.begin_edit(9, "x"), Err(ReconcileError::UnknownComment(9)));
        assert_eq!(r.begin_delete(9), Err(ReconcileError::UnknownComment(9)));
        assert_eq!(r.state(), &SyncState::Idle);
    }
}
