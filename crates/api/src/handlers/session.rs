use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::CurrentSession;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /session
///
/// The caller's profile with `isAdmin` and `langToken`, or `null` when
/// anonymous or when the token names an unknown user.
pub async fn current_session(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let profile = match session {
        Some(session) => state.users.find_by_id(session.user_id).await?,
        None => None,
    };
    Ok(Json(DataResponse { data: profile }))
}
