//! Handlers for comment CRUD and rewrites.
//!
//! Every rule (CAPTCHA, ownership, shape, rate limit, filtering) lives in
//! `quill_core`; these handlers only translate HTTP to domain calls.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use quill_core::moderation::CreateCommentRequest;
use quill_core::translation::TranslationCase;
use quill_core::types::DbId;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentSession;
use crate::middleware::body::JsonBody;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /posts/{slug}/comments
pub async fn list_for_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let comments = state.comments.list_for_post(&slug).await?;
    Ok(Json(DataResponse { data: comments }))
}

/// POST /comments
///
/// Runs the full moderation pipeline. Returns 201 with the stored comment.
pub async fn create_comment(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    body: JsonBody,
) -> AppResult<impl IntoResponse> {
    let input = CreateCommentRequest {
        post_slug: body.string(&["postSlug"]),
        content: body.string(&["content"]),
        captcha_token: body.string(&["captchaToken", "token"]),
    };

    let comment = state
        .moderation
        .create_comment(session.as_ref(), input)
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: comment })))
}

/// GET /comments/{id}
pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let comment = state.comments.get_by_id(id).await?;
    Ok(Json(DataResponse { data: comment }))
}

/// PUT /comments/{id}
pub async fn update_comment(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: JsonBody,
) -> AppResult<impl IntoResponse> {
    let content = body.string(&["content"]).unwrap_or_default();
    let comment = state
        .moderation
        .update_comment(session.as_ref(), id, &content)
        .await?;
    Ok(Json(DataResponse { data: comment }))
}

/// DELETE /comments/{id}
pub async fn delete_comment(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.moderation.delete_comment(session.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /comments/{id}/translate
///
/// Body: `{ "caseType": "spanish" | "german" | "bruh" | "intellegizer" | "none" }`.
pub async fn translate_comment(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: JsonBody,
) -> AppResult<impl IntoResponse> {
    let case: TranslationCase = body
        .string(&["caseType"])
        .ok_or_else(|| AppError::BadRequest("caseType must be a string".into()))?
        .parse()?;

    let comment = state
        .translation
        .translate(session.as_ref(), id, case)
        .await?;

    Ok(Json(DataResponse { data: comment }))
}
