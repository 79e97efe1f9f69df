//! Ingestion gateway: the write surface used by the harvester.
//!
//! Owns no state of its own. Every write is checked against the source
//! registry first; an unregistered source is rejected before anything is
//! handed to the store.

use std::sync::Arc;

use thiserror::Error;

use crate::{
  Classify, ErrorClass,
  batch::IngestReport,
  course::CourseRow,
  run::{NewRun, RunMetrics},
  schema::Schema,
  source::{Source, SourceId},
  store::CatalogStore,
};

#[derive(Debug, Error)]
pub enum GatewayError<E> {
  #[error("unknown source: {0}")]
  UnknownSource(SourceId),

  #[error(transparent)]
  Invalid(crate::Error),

  #[error("store error: {0}")]
  Store(#[source] E),
}

impl<E: Classify> Classify for GatewayError<E> {
  fn class(&self) -> ErrorClass {
    match self {
      GatewayError::UnknownSource(_) => ErrorClass::NotFound,
      GatewayError::Invalid(e) => e.class(),
      GatewayError::Store(e) => e.class(),
    }
  }
}

pub struct Gateway<S> {
  store: Arc<S>,
}

impl<S> Clone for Gateway<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: CatalogStore> Gateway<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  async fn require_source(&self, id: &SourceId) -> Result<Source, GatewayError<S::Error>> {
    self
      .store
      .get_source(id.clone())
      .await
      .map_err(GatewayError::Store)?
      .ok_or_else(|| GatewayError::UnknownSource(id.clone()))
  }

  /// Replace the extraction schema of a registered source.
  pub async fn put_schema(
    &self,
    id: SourceId,
    payload: serde_json::Value,
  ) -> Result<Schema, GatewayError<S::Error>> {
    self.require_source(&id).await?;
    let schema = self
      .store
      .put_schema(id.clone(), payload)
      .await
      .map_err(GatewayError::Store)?;
    tracing::info!(source_id = %id, "schema replaced");
    Ok(schema)
  }

  /// Merge a batch of extracted rows for a registered source.
  pub async fn ingest_batch(
    &self,
    id: SourceId,
    rows: Vec<CourseRow>,
  ) -> Result<IngestReport, GatewayError<S::Error>> {
    self.require_source(&id).await?;
    let submitted = rows.len();
    let report = self
      .store
      .ingest_batch(id.clone(), rows)
      .await
      .map_err(GatewayError::Store)?;

    tracing::info!(
      source_id = %id,
      submitted,
      inserted = report.inserted,
      updated = report.updated,
      rejected = report.rejected.len(),
      "course batch ingested"
    );
    Ok(report)
  }

  /// Append a run report for a registered source.
  pub async fn record_run(
    &self,
    id: SourceId,
    run: NewRun,
  ) -> Result<RunMetrics, GatewayError<S::Error>> {
    run.validate().map_err(GatewayError::Invalid)?;
    self.require_source(&id).await?;
    let metrics = self
      .store
      .record_run(id.clone(), run)
      .await
      .map_err(GatewayError::Store)?;
    tracing::info!(source_id = %id, run_id = metrics.run_id, "run recorded");
    Ok(metrics)
  }
}
