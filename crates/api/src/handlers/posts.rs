//! Read-only post endpoints backed by the cached [`PostStore`].
//!
//! [`PostStore`]: quill_core::posts::PostStore

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use quill_core::error::CoreError;
use quill_core::posts::PostField;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// `?fields=title,date,excerpt`. Absent or empty selects every field.
#[derive(Debug, Default, Deserialize)]
pub struct FieldsParams {
    pub fields: Option<String>,
}

impl FieldsParams {
    pub fn parse(&self) -> Result<Vec<PostField>, AppError> {
        let Some(raw) = self.fields.as_deref().filter(|f| !f.trim().is_empty()) else {
            return Ok(PostField::ALL.to_vec());
        };

        raw.split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(|f| f.parse::<PostField>().map_err(AppError::BadRequest))
            .collect()
    }
}

/// GET /posts?fields=
pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<FieldsParams>,
) -> AppResult<impl IntoResponse> {
    let fields = params.parse()?;
    let posts = state.posts.get_all(&fields).await.map_err(CoreError::from)?;
    Ok(Json(DataResponse { data: posts }))
}

/// GET /posts/slugs
pub async fn list_slugs(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let slugs = state.posts.list_slugs().await.map_err(CoreError::from)?;
    Ok(Json(DataResponse { data: slugs }))
}

/// GET /posts/latest?fields=
///
/// `data` is `null` when there are no posts.
pub async fn latest_post(
    State(state): State<AppState>,
    Query(params): Query<FieldsParams>,
) -> AppResult<impl IntoResponse> {
    let fields = params.parse()?;
    let post = state.posts.latest(&fields).await.map_err(CoreError::from)?;
    Ok(Json(DataResponse { data: post }))
}

/// GET /posts/{slug}?fields=
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<FieldsParams>,
) -> AppResult<impl IntoResponse> {
    let fields = params.parse()?;
    let post = state
        .posts
        .get_by_slug(&slug, &fields)
        .await
        .map_err(CoreError::from)?;
    Ok(Json(DataResponse { data: post }))
}
