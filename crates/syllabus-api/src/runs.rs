//! Handlers for run reports and the performance listing.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/sources/{id}/runs` | Body: [`NewRun`]; returns 201 + derived metrics |
//! | `GET`  | `/performance` | Filters, `sort`/`order`, `limit`/`offset` |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use syllabus_core::{
  run::{NewRun, PerfSortField, PerformanceQuery, RunMetrics, SortOrder},
  source::SourceId,
  store::CatalogStore,
};

use crate::{
  ApiState,
  error::ApiError,
  extract::{ApiJson, ApiPath, ApiQuery},
};

// ─── Record ───────────────────────────────────────────────────────────────────

/// `POST /sources/{id}/runs`
pub async fn record<S: CatalogStore>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<String>,
  ApiJson(run): ApiJson<NewRun>,
) -> Result<impl IntoResponse, ApiError> {
  let metrics = state.gateway.record_run(SourceId::new(id), run).await?;
  Ok((StatusCode::CREATED, Json(metrics)))
}

// ─── Performance ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PerformanceParams {
  pub source_id:      Option<String>,
  /// Exact display name.
  pub source_name:    Option<String>,
  pub run_id:         Option<i64>,
  pub started_after:  Option<DateTime<Utc>>,
  pub started_before: Option<DateTime<Utc>>,
  /// Any field of [`RunMetrics`]; defaults to `finished_at`.
  pub sort:           Option<String>,
  pub order:          Option<SortOrder>,
  pub limit:          Option<usize>,
  pub offset:         Option<usize>,
}

impl PerformanceParams {
  fn into_query(self) -> Result<PerformanceQuery, ApiError> {
    let sort = match self.sort.as_deref() {
      Some(s) if !s.trim().is_empty() => PerfSortField::parse(s)?,
      _ => PerfSortField::default(),
    };
    Ok(PerformanceQuery {
      source_id: self.source_id.map(SourceId::new),
      source_name: self.source_name,
      run_id: self.run_id,
      started_after: self.started_after,
      started_before: self.started_before,
      sort,
      order: self.order.unwrap_or_default(),
      limit: self.limit,
      offset: self.offset,
    })
  }
}

/// `GET /performance[?source_id=..][&sort=records_per_sec][&order=asc]...`
pub async fn performance<S: CatalogStore>(
  State(state): State<ApiState<S>>,
  ApiQuery(params): ApiQuery<PerformanceParams>,
) -> Result<Json<Vec<RunMetrics>>, ApiError> {
  let query = params.into_query()?;
  let runs = state
    .store
    .performance(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(runs))
}
