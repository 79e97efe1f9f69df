//! Handlers for the aggregation views.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/status` | Per-source status with derived label and indicator |
//! | `GET`  | `/views` | Names of the `dashboard_*` views |
//! | `GET`  | `/views/{name}` | `?limit`; unknown names return `[]` |

use axum::{
  Json,
  extract::State,
};
use serde::Deserialize;
use syllabus_core::{
  status::SourceStatus,
  store::CatalogStore,
  view::{DEFAULT_VIEW_LIMIT, MAX_VIEW_LIMIT, Row},
};

use crate::{
  ApiState,
  error::ApiError,
  extract::{ApiPath, ApiQuery},
};

/// `GET /status`
pub async fn status<S: CatalogStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<SourceStatus>>, ApiError> {
  let rows = state
    .store
    .source_status(state.policy)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(rows))
}

/// `GET /views`
pub async fn list<S: CatalogStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<String>>, ApiError> {
  let names = state.store.list_views().await.map_err(ApiError::store)?;
  Ok(Json(names))
}

#[derive(Debug, Deserialize)]
pub struct FetchParams {
  pub limit: Option<usize>,
}

/// `GET /views/{name}[?limit=..]`
pub async fn fetch<S: CatalogStore>(
  State(state): State<ApiState<S>>,
  ApiPath(name): ApiPath<String>,
  ApiQuery(params): ApiQuery<FetchParams>,
) -> Result<Json<Vec<Row>>, ApiError> {
  let limit = params.limit.unwrap_or(DEFAULT_VIEW_LIMIT).clamp(1, MAX_VIEW_LIMIT);
  let rows = state
    .store
    .fetch_view(name.clone(), limit)
    .await
    .map_err(ApiError::store)?;

  if rows.is_none() {
    tracing::debug!(view = %name, "unknown view requested");
  }
  Ok(Json(rows.unwrap_or_default()))
}
