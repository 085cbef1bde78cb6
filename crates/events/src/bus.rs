//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>`; publishing never blocks and
//! never waits for subscribers.

use quill_core::comments::Comment;
use quill_core::types::Timestamp;
use serde::Serialize;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// BlogEvent
// ---------------------------------------------------------------------------

/// Something that happened on the blog.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlogEvent {
    CommentCreated {
        comment: Comment,
        occurred_at: Timestamp,
    },
}

impl BlogEvent {
    pub fn comment_created(comment: Comment) -> Self {
        BlogEvent::CommentCreated {
            comment,
            occurred_at: chrono::Utc::now(),
        }
    }

    /// Dot-separated event name, e.g. `"comment.created"`.
    pub fn event_type(&self) -> &'static str {
        match self {
            BlogEvent::CommentCreated { .. } => "comment.created",
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// When the buffer is full the oldest unconsumed events are dropped and slow
/// receivers observe `RecvError::Lagged`.
pub struct EventBus {
    sender: broadcast::Sender<BlogEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers. Returns how many
    /// subscribers it reached; zero means it was dropped.
    pub fn publish(&self, event: BlogEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BlogEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
