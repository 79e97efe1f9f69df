//! Handlers for the catalog ledger.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/sources/{id}/courses` | Body: `{"rows":[...]}`; per-row rejections in the 200 response |
//! | `GET`  | `/sources/{id}/courses` | `?limit&offset`; newest first |
//! | `GET`  | `/sources/{id}/preview` | `?limit`; deduplicated across the source's school |

use axum::{
  Json,
  extract::State,
};
use serde::Deserialize;
use syllabus_core::{
  batch::IngestReport,
  course::{Course, CourseRow},
  source::SourceId,
  store::CatalogStore,
  view::{CoursePreview, DEFAULT_PREVIEW_LIMIT, MAX_PREVIEW_LIMIT},
};

use crate::{
  ApiState,
  error::ApiError,
  extract::{ApiJson, ApiPath, ApiQuery},
};

const DEFAULT_PAGE: usize = 100;
const MAX_PAGE: usize = 1000;

// ─── Ingest ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct IngestBody {
  pub rows: Vec<CourseRow>,
}

/// `POST /sources/{id}/courses`
pub async fn ingest<S: CatalogStore>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<String>,
  ApiJson(body): ApiJson<IngestBody>,
) -> Result<Json<IngestReport>, ApiError> {
  let report = state
    .gateway
    .ingest_batch(SourceId::new(id), body.rows)
    .await?;
  Ok(Json(report))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /sources/{id}/courses[?limit=..][&offset=..]`
pub async fn list<S: CatalogStore>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<String>,
  ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<Course>>, ApiError> {
  let limit = params.limit.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE);
  let courses = state
    .store
    .list_courses(SourceId::new(id), limit, params.offset.unwrap_or(0))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(courses))
}

// ─── Preview ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PreviewParams {
  pub limit: Option<usize>,
}

/// `GET /sources/{id}/preview[?limit=..]`: unknown sources yield an empty
/// preview rather than a 404.
pub async fn preview<S: CatalogStore>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<String>,
  ApiQuery(params): ApiQuery<PreviewParams>,
) -> Result<Json<CoursePreview>, ApiError> {
  let limit = params
    .limit
    .unwrap_or(DEFAULT_PREVIEW_LIMIT)
    .clamp(1, MAX_PREVIEW_LIMIT);
  let preview = state
    .store
    .course_preview(SourceId::new(id), limit)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(preview))
}
