//! Quill API server library.
//!
//! Exposes the HTTP building blocks (config, state, error handling, routes,
//! third-party clients) so integration tests and the binary entrypoint can
//! both access them.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod integrations;
pub mod middleware;
pub mod notifications;
pub mod response;
pub mod routes;
pub mod state;
