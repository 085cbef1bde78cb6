//! Comment rows, joined with their commenter.

use quill_core::comments::{Comment, Commenter};
use quill_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A `comments` row joined with the commenter's public profile.
#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: DbId,
    pub content: String,
    pub post_slug: String,
    pub created_at: Timestamp,
    pub commenter_id: DbId,
    pub commenter_name: Option<String>,
    pub commenter_image: Option<String>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            content: row.content,
            post_slug: row.post_slug,
            commenter: Commenter {
                id: row.commenter_id,
                name: row.commenter_name,
                image: row.commenter_image,
            },
            created_at: row.created_at,
        }
    }
}
