//! The moderation pipeline's notification collaborator.

use std::sync::Arc;

use quill_core::comments::Comment;
use quill_core::error::CoreResult;
use quill_core::ports::CommentNotifier;

use crate::bus::{BlogEvent, EventBus};

/// Publishes comment events onto the bus and returns immediately.
pub struct BusNotifier {
    bus: Arc<EventBus>,
}

impl BusNotifier {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }
}

impl CommentNotifier for BusNotifier {
    fn comment_created(&self, comment: &Comment) -> CoreResult<()> {
        let receivers = self.bus.publish(BlogEvent::comment_created(comment.clone()));
        if receivers == 0 {
            tracing::debug!(comment_id = comment.id, "No notification subscribers");
        }
        Ok(())
    }
}
