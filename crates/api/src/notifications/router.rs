//! Event-to-email routing.
//!
//! [`NotificationRouter`] subscribes to the event bus and mails the site
//! administrator about each new comment. It runs as its own task so the
//! request that created the comment never waits on SMTP.

use std::sync::Arc;

use quill_events::{BlogEvent, EmailSender, OutgoingEmail};
use tokio::sync::broadcast;

pub struct NotificationRouter {
    admin_email: String,
    sender: Arc<dyn EmailSender>,
}

impl NotificationRouter {
    pub fn new(admin_email: String, sender: Arc<dyn EmailSender>) -> Self {
        Self {
            admin_email,
            sender,
        }
    }

    /// Run the routing loop until the [`EventBus`](quill_events::EventBus)
    /// is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<BlogEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.route_event(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    async fn route_event(&self, event: &BlogEvent) {
        let BlogEvent::CommentCreated { comment, .. } = event;
        let email = OutgoingEmail::new_comment(&self.admin_email, comment);

        match self.sender.send(&email).await {
            Ok(()) => tracing::info!(
                comment_id = comment.id,
                post_slug = %comment.post_slug,
                "Admin notified of new comment"
            ),
            Err(e) => tracing::error!(
                error = %e,
                event_type = event.event_type(),
                comment_id = comment.id,
                "Failed to deliver admin notification"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use quill_core::comments::{Comment, Commenter};
    use quill_events::{EmailError, EventBus};

    use super::*;

    #[derive(Default)]
    struct CapturingSender {
        sent: Mutex<Vec<OutgoingEmail>>,
        fail: bool,
    }

    #[async_trait]
    impl EmailSender for CapturingSender {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
            self.sent.lock().unwrap().push(email.clone());
            if self.fail {
                return Err(EmailError::Build("connection refused".into()));
            }
            Ok(())
        }
    }

    fn comment(id: i64) -> Comment {
        Comment {
            id,
            content: "Nice post".into(),
            post_slug: "hello-world".into(),
            commenter: Commenter {
                id: 3,
                name: Some("Ada".into()),
                image: None,
            },
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn mails_admin_for_each_comment_until_bus_closes() {
        let bus = EventBus::default();
        let sender = Arc::new(CapturingSender::default());
        let router = NotificationRouter::new("admin@example.com".into(), sender.clone());
        let handle = tokio::spawn(router.run(bus.subscribe()));

        bus.publish(BlogEvent::comment_created(comment(1)));
        bus.publish(BlogEvent::comment_created(comment(2)));
        drop(bus);
        handle.await.unwrap();

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "admin@example.com");
        assert_eq!(sent[0].subject, "New Comment on hello-world");
    }

    #[tokio::test]
    async fn delivery_failure_does_not_stop_the_loop() {
        let bus = EventBus::default();
        let sender = Arc::new(CapturingSender {
            fail: true,
            ..Default::default()
        });
        let router = NotificationRouter::new("admin@example.com".into(), sender.clone());
        let handle = tokio::spawn(router.run(bus.subscribe()));

        bus.publish(BlogEvent::comment_created(comment(1)));
        bus.publish(BlogEvent::comment_created(comment(2)));
        drop(bus);
        handle.await.unwrap();

        assert_eq!(sender.sent.lock().unwrap().len(), 2);
    }
}
