//! Loosely typed JSON bodies.

use axum::extract::{FromRequest, Request};
use axum::Json;
use serde_json::Value;

use crate::error::AppError;

/// A JSON request body read as an untyped [`Value`].
///
/// Wrongly typed fields are left for the domain to reject, so a body like
/// `{"content": 5}` still goes through the CAPTCHA and session checks first.
/// Only a body that is not JSON at all is refused here, as a JSON 400.
#[derive(Debug, Clone)]
pub struct JsonBody(pub Value);

impl JsonBody {
    /// The string under the first of `keys` that holds one. Non-string
    /// values count as absent.
    pub fn string(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .find_map(|key| self.0.get(*key).and_then(Value::as_str))
            .map(str::to_owned)
    }
}

impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "Rejecting request body");
                Err(AppError::BadRequest(rejection.body_text()))
            }
        }
    }
}
