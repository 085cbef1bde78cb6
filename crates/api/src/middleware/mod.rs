pub mod auth;
pub mod body;
