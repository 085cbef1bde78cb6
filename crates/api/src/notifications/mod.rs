//! Background delivery of blog events to the site administrator.

pub mod router;

pub use router::NotificationRouter;
