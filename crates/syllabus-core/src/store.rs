//! The `CatalogStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `syllabus-store-sqlite`). Higher layers (`syllabus-api`, the ingestion
//! [`Gateway`](crate::gateway::Gateway)) depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use crate::{
  Classify,
  batch::IngestReport,
  course::{Course, CourseRow},
  run::{NewRun, PerformanceQuery, RunMetrics},
  schema::Schema,
  source::{NewSource, Source, SourceId},
  status::{SourceStatus, StatusPolicy},
  view::{CoursePreview, Row},
};

/// Abstraction over a catalog backend.
///
/// Course writes go through [`ingest_batch`](Self::ingest_batch), which must
/// serialise concurrent batches for the same source so that two writers can
/// never both insert the same identity key. Reads never take that scope.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CatalogStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Source registry ───────────────────────────────────────────────────

  /// Insert a source, or refresh the name, school and enabled flag of an
  /// existing one. `created_at` is preserved on refresh.
  fn register_source(
    &self,
    input: NewSource,
  ) -> impl Future<Output = Result<Source, Self::Error>> + Send + '_;

  /// Returns `None` if the source is not registered.
  fn get_source(
    &self,
    id: SourceId,
  ) -> impl Future<Output = Result<Option<Source>, Self::Error>> + Send + '_;

  fn list_sources(&self) -> impl Future<Output = Result<Vec<Source>, Self::Error>> + Send + '_;

  // ── Schema store ──────────────────────────────────────────────────────

  /// Replace the schema for `id` in a single atomic statement.
  fn put_schema(
    &self,
    id: SourceId,
    payload: serde_json::Value,
  ) -> impl Future<Output = Result<Schema, Self::Error>> + Send + '_;

  fn get_schema(
    &self,
    id: SourceId,
  ) -> impl Future<Output = Result<Option<Schema>, Self::Error>> + Send + '_;

  // ── Catalog ledger ────────────────────────────────────────────────────

  /// Merge `rows` into the ledger for `id`.
  ///
  /// Rows with an empty title are reported in
  /// [`IngestReport::rejected`] and skipped. Intra-batch duplicates collapse
  /// to the last occurrence. Waiting too long for the per-source scope fails
  /// with an error whose class is
  /// [`ErrorClass::Contention`](crate::ErrorClass::Contention).
  fn ingest_batch(
    &self,
    id: SourceId,
    rows: Vec<CourseRow>,
  ) -> impl Future<Output = Result<IngestReport, Self::Error>> + Send + '_;

  /// Records for `id`, newest first.
  fn list_courses(
    &self,
    id: SourceId,
    limit: usize,
    offset: usize,
  ) -> impl Future<Output = Result<Vec<Course>, Self::Error>> + Send + '_;

  // ── Run metrics ───────────────────────────────────────────────────────

  /// Append a run; the store assigns the next run id for the source.
  fn record_run(
    &self,
    id: SourceId,
    run: NewRun,
  ) -> impl Future<Output = Result<RunMetrics, Self::Error>> + Send + '_;

  // ── Aggregation views ─────────────────────────────────────────────────

  fn performance<'a>(
    &'a self,
    query: &'a PerformanceQuery,
  ) -> impl Future<Output = Result<Vec<RunMetrics>, Self::Error>> + Send + 'a;

  fn source_status(
    &self,
    policy: StatusPolicy,
  ) -> impl Future<Output = Result<Vec<SourceStatus>, Self::Error>> + Send + '_;

  /// Sample of courses for the school `id` belongs to. An unknown source or
  /// an empty school yields an empty preview, not an error.
  fn course_preview(
    &self,
    id: SourceId,
    limit: usize,
  ) -> impl Future<Output = Result<CoursePreview, Self::Error>> + Send + '_;

  // ── Named views ───────────────────────────────────────────────────────

  fn list_views(&self) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Returns `None` for a name that is not a registered view.
  fn fetch_view(
    &self,
    name: String,
    limit: usize,
  ) -> impl Future<Output = Result<Option<Vec<Row>>, Self::Error>> + Send + '_;
}
