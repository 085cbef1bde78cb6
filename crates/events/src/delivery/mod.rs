//! Outbound delivery channels for blog notifications.

pub mod email;
