//! Quill core: the comment submission and moderation domain.
//!
//! Everything in this crate is storage- and transport-agnostic. Durable
//! state and outbound calls are reached through the traits in [`ports`];
//! `quill-db`, `quill-events` and `quill-api` provide the production
//! implementations.

pub mod clock;
pub mod comments;
pub mod content_filter;
pub mod error;
pub mod moderation;
pub mod ports;
pub mod posts;
pub mod rate_limit;
pub mod reconcile;
pub mod translation;
pub mod types;
pub mod users;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
