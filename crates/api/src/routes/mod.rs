pub mod comments;
pub mod health;
pub mod posts;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /session                                 current session or null
///
/// /posts                                   list (?fields=)
/// /posts/slugs                             all slugs
/// /posts/latest                            newest post (?fields=)
/// /posts/{slug}                            single post (?fields=)
/// /posts/{slug}/comments                   comments on a post, oldest first
///
/// /comments                                create (POST)
/// /comments/{id}                           get, update (PUT), delete
/// /comments/{id}/translate                 rewrite (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/session", get(handlers::session::current_session))
        .nest("/posts", posts::router())
        .nest("/comments", comments::router())
}
