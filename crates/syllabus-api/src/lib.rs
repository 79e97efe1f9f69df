//! JSON REST API for Syllabus.
//!
//! Exposes an axum [`Router`] backed by any [`CatalogStore`]. Writes go
//! through the ingestion [`Gateway`]; reads go straight to the store.
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", syllabus_api::api_router(store.clone(), StatusPolicy::default()))
//! ```

pub mod courses;
pub mod error;
pub mod extract;
pub mod runs;
pub mod sources;
pub mod views;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use syllabus_core::{gateway::Gateway, status::StatusPolicy, store::CatalogStore};

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:   Arc<S>,
  pub gateway: Gateway<S>,
  pub policy:  StatusPolicy,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      gateway: self.gateway.clone(),
      policy:  self.policy,
    }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, policy: StatusPolicy) -> Router<()>
where
  S: CatalogStore + 'static,
{
  let state = ApiState {
    gateway: Gateway::new(Arc::clone(&store)),
    store,
    policy,
  };

  Router::new()
    // Registry and schemas
    .route("/sources", get(sources::list::<S>))
    .route("/sources/{id}", get(sources::get_one::<S>).put(sources::register::<S>))
    .route(
      "/sources/{id}/schema",
      get(sources::get_schema::<S>).put(sources::put_schema::<S>),
    )
    // Ledger
    .route(
      "/sources/{id}/courses",
      get(courses::list::<S>).post(courses::ingest::<S>),
    )
    .route("/sources/{id}/preview", get(courses::preview::<S>))
    // Runs
    .route("/sources/{id}/runs", post(runs::record::<S>))
    .route("/performance", get(runs::performance::<S>))
    // Aggregations
    .route("/status", get(views::status::<S>))
    .route("/views", get(views::list::<S>))
    .route("/views/{name}", get(views::fetch::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use syllabus_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  async fn app() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    api_router(Arc::new(store), StatusPolicy::default())
  }

  async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        req = req.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn register(app: &Router, id: &str) {
    let (status, _) = send(
      app,
      "PUT",
      &format!("/sources/{id}"),
      Some(json!({ "display_name": "Example College" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
  }

  #[tokio::test]
  async fn register_then_get_source() {
    let app = app().await;
    register(&app, "ex").await;

    let (status, body) = send(&app, "GET", "/sources/ex", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["school"], "example_college");

    let (status, body) = send(&app, "GET", "/sources/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["retryable"], false);
  }

  #[tokio::test]
  async fn ingest_to_unknown_source_is_404_not_retryable() {
    let app = app().await;
    let (status, body) = send(
      &app,
      "POST",
      "/sources/ghost/courses",
      Some(json!({ "rows": [{ "code": "CS1", "title": "Intro" }] })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["retryable"], false);
    assert!(body["error"].as_str().unwrap().contains("ghost"));
  }

  #[tokio::test]
  async fn empty_titles_come_back_in_rejected() {
    let app = app().await;
    register(&app, "ex").await;

    let (status, body) = send(
      &app,
      "POST",
      "/sources/ex/courses",
      Some(json!({ "rows": [
        { "code": "CS1", "title": "" },
        { "code": "CS2", "title": "Kept", "description": "d" },
      ] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inserted"], 1);
    assert_eq!(body["rejected"][0]["index"], 0);

    let (_, courses) = send(&app, "GET", "/sources/ex/courses", None).await;
    assert_eq!(courses.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn null_or_missing_titles_are_rejected_per_row() {
    let app = app().await;
    register(&app, "ex").await;

    let (status, body) = send(
      &app,
      "POST",
      "/sources/ex/courses",
      Some(json!({ "rows": [
        { "code": "CS1", "title": null },
        { "code": "CS2" },
        { "code": "CS3", "title": "Kept" },
      ] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inserted"], 1);
    assert_eq!(body["rejected"][0]["index"], 0);
    assert_eq!(body["rejected"][1]["index"], 1);
  }

  #[tokio::test]
  async fn malformed_body_gets_the_json_error_envelope() {
    let app = app().await;
    register(&app, "ex").await;

    let req = Request::builder()
      .method("POST")
      .uri("/sources/ex/courses")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from("{\"rows\": [oops"))
      .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["retryable"], false);
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn bad_query_values_get_the_json_error_envelope() {
    let app = app().await;

    let (status, body) = send(&app, "GET", "/performance?order=ASC", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["retryable"], false);

    let (status, body) = send(&app, "GET", "/views/dashboard_recent_runs?limit=-1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["retryable"], false);
  }

  #[tokio::test]
  async fn schema_round_trips_through_put_and_get() {
    let app = app().await;
    register(&app, "ex").await;

    let (status, _) = send(&app, "GET", "/sources/ex/schema", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
      &app,
      "PUT",
      "/sources/ex/schema",
      Some(json!({ "fields": ["code", "title"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", "/sources/ex/schema", None).await;
    assert_eq!(body["payload"]["fields"][1], "title");
  }

  #[tokio::test]
  async fn run_with_bad_timing_is_400() {
    let app = app().await;
    register(&app, "ex").await;

    let (status, body) = send(
      &app,
      "POST",
      "/sources/ex/runs",
      Some(json!({
        "urls_seen": 1,
        "records_extracted": 1,
        "concurrency": 1,
        "started_at": "2026-01-02T00:00:00Z",
        "finished_at": "2026-01-01T00:00:00Z",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["retryable"], false);
  }

  #[tokio::test]
  async fn performance_lists_recorded_runs() {
    let app = app().await;
    register(&app, "ex").await;

    let (status, _) = send(
      &app,
      "POST",
      "/sources/ex/runs",
      Some(json!({
        "urls_seen": 10,
        "records_extracted": 40,
        "concurrency": 2,
        "started_at": "2026-01-01T00:00:00Z",
        "finished_at": "2026-01-01T00:00:20Z",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
      &app,
      "GET",
      "/performance?source_id=ex&sort=records_per_sec&order=asc",
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["run_id"], 1);
    assert_eq!(body[0]["records_per_sec"], 2.0);

    let (status, _) = send(&app, "GET", "/performance?sort=bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn unknown_view_is_empty_not_an_error() {
    let app = app().await;

    let (status, body) = send(&app, "GET", "/views", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
      body
        .as_array()
        .unwrap()
        .iter()
        .any(|v| v == "dashboard_recent_runs")
    );

    let (status, body) = send(&app, "GET", "/views/not_a_view", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
  }

  #[tokio::test]
  async fn preview_and_status_for_an_idle_source() {
    let app = app().await;
    register(&app, "ex").await;

    let (status, body) = send(&app, "GET", "/sources/ex/preview?limit=3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["distinct_course_count"], 0);
    assert_eq!(body["sample"], json!([]));

    let (status, body) = send(&app, "GET", "/sources/ghost/preview", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source_display_name"], Value::Null);

    let (status, body) = send(&app, "GET", "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["status"], "not_started");
    assert_eq!(body[0]["indicator"], "grey");
  }
}
