use std::sync::Arc;

use quill_core::comments::CommentStore;
use quill_core::moderation::ModerationPipeline;
use quill_core::ports::UserRepository;
use quill_core::posts::PostStore;
use quill_core::translation::TranslationWorkflow;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub posts: Arc<PostStore>,
    pub comments: CommentStore,
    pub users: Arc<dyn UserRepository>,
    pub moderation: Arc<ModerationPipeline>,
    pub translation: Arc<TranslationWorkflow>,
}
