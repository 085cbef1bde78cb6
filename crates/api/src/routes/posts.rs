use axum::routing::get;
use axum::Router;

use crate::handlers::{comments, posts};
use crate::state::AppState;

/// Routes mounted at `/posts`.
///
/// ```text
/// GET    /                  list_posts
/// GET    /slugs             list_slugs
/// GET    /latest            latest_post
/// GET    /{slug}            get_post
/// GET    /{slug}/comments   list_for_post
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(posts::list_posts))
        .route("/slugs", get(posts::list_slugs))
        .route("/latest", get(posts::latest_post))
        .route("/{slug}", get(posts::get_post))
        .route("/{slug}/comments", get(comments::list_for_post))
}
