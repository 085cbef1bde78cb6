use axum::routing::{get, post};
use axum::Router;

use crate::handlers::comments;
use crate::state::AppState;

/// Routes mounted at `/comments`.
///
/// ```text
/// POST   /                  create_comment
/// GET    /{id}              get_comment
/// PUT    /{id}              update_comment
/// DELETE /{id}              delete_comment
/// POST   /{id}/translate    translate_comment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(comments::create_comment))
        .route(
            "/{id}",
            get(comments::get_comment)
                .put(comments::update_comment)
                .delete(comments::delete_comment),
        )
        .route("/{id}/translate", post(comments::translate_comment))
}
