//! Session extraction from a JWT Bearer token.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use quill_core::types::Session;

use crate::auth::jwt::validate_token;
use crate::state::AppState;

/// The caller's session, or `None` for anonymous visitors.
///
/// Never rejects: a missing, malformed or expired token is treated as an
/// anonymous request, and the domain operation decides whether that is an
/// error.
///
/// ```ignore
/// async fn my_handler(CurrentSession(session): CurrentSession) -> AppResult<Json<()>> {
///     let user_id = session.map(|s| s.user_id);
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CurrentSession(pub Option<Session>);

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
        else {
            return Ok(CurrentSession(None));
        };

        match validate_token(token, &state.config.jwt) {
            Ok(claims) => Ok(CurrentSession(Some(claims.session()))),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid bearer token");
                Ok(CurrentSession(None))
            }
        }
    }
}
