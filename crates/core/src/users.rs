//! The slice of the user record this crate reads.
//!
//! Users are owned by the authentication collaborator; quill only reads the
//! profile and the translation balance.

use serde::Serialize;

use crate::types::DbId;

/// Public profile plus translation balance, as returned by session lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: DbId,
    pub name: Option<String>,
    pub image: Option<String>,
    pub is_admin: bool,
    /// Remaining paid rewrites. Never negative.
    pub lang_token: i32,
}
