/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// The caller of a request, as vouched for by the authentication collaborator.
///
/// Anonymous visitors are represented as `Option::<Session>::None` at every
/// entry point; the pipeline decides whether that is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: DbId,
    pub is_admin: bool,
}
