//! Quill event bus and notification delivery.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`BlogEvent`]: the domain event envelope.
//! - [`BusNotifier`]: the comment notifier handed to the moderation
//!   pipeline. It only publishes; delivery happens in a subscriber.
//! - [`delivery`]: outbound channels (SMTP email).

pub mod bus;
pub mod delivery;
pub mod notifier;

pub use bus::{BlogEvent, EventBus};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError, EmailSender, OutgoingEmail};
pub use notifier::BusNotifier;
