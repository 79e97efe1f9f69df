//! Handlers for the source registry and per-source schemas.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/sources` | All registered sources |
//! | `PUT`  | `/sources/{id}` | Body: [`RegisterBody`]; insert or refresh |
//! | `GET`  | `/sources/{id}` | 404 if not registered |
//! | `GET`  | `/sources/{id}/schema` | 404 if no schema yet |
//! | `PUT`  | `/sources/{id}/schema` | Body: any JSON document; replaces in place |

use axum::{
  Json,
  extract::State,
};
use serde::Deserialize;
use syllabus_core::{
  schema::Schema,
  source::{NewSource, Source, SourceId},
  store::CatalogStore,
};

use crate::{
  ApiState,
  error::ApiError,
  extract::{ApiJson, ApiPath},
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /sources`
pub async fn list<S: CatalogStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<Source>>, ApiError> {
  let sources = state.store.list_sources().await.map_err(ApiError::store)?;
  Ok(Json(sources))
}

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub display_name: String,
  #[serde(default)]
  pub school:       Option<String>,
  #[serde(default = "default_enabled")]
  pub enabled:      bool,
}

fn default_enabled() -> bool { true }

/// `PUT /sources/{id}`: body: `{"display_name":"...","school":"...","enabled":true}`
pub async fn register<S: CatalogStore>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<String>,
  ApiJson(body): ApiJson<RegisterBody>,
) -> Result<Json<Source>, ApiError> {
  if id.trim().is_empty() || body.display_name.trim().is_empty() {
    return Err(ApiError::BadRequest("source id and display name must not be empty".into()));
  }

  let source = state
    .store
    .register_source(NewSource {
      source_id:    SourceId::new(id),
      display_name: body.display_name,
      school:       body.school,
      enabled:      body.enabled,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(source_id = %source.source_id, school = %source.school, "source registered");
  Ok(Json(source))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /sources/{id}`
pub async fn get_one<S: CatalogStore>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<String>,
) -> Result<Json<Source>, ApiError> {
  let source = state
    .store
    .get_source(SourceId::new(id.clone()))
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("source {id} not found")))?;
  Ok(Json(source))
}

// ─── Schema ───────────────────────────────────────────────────────────────────

/// `GET /sources/{id}/schema`
pub async fn get_schema<S: CatalogStore>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<String>,
) -> Result<Json<Schema>, ApiError> {
  let schema = state
    .store
    .get_schema(SourceId::new(id.clone()))
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no schema for source {id}")))?;
  Ok(Json(schema))
}

/// `PUT /sources/{id}/schema`: the body is stored verbatim.
pub async fn put_schema<S: CatalogStore>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<String>,
  ApiJson(payload): ApiJson<serde_json::Value>,
) -> Result<Json<Schema>, ApiError> {
  let schema = state.gateway.put_schema(SourceId::new(id), payload).await?;
  Ok(Json(schema))
}
