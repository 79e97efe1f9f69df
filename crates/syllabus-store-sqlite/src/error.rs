//! Error type for `syllabus-store-sqlite`.

use std::time::Duration;

use rusqlite::ErrorCode;
use syllabus_core::{Classify, ErrorClass, source::SourceId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] syllabus_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// The per-source write scope could not be acquired in time. Safe to
  /// retry: re-submitting a batch is idempotent.
  #[error("timed out after {waited:?} waiting for the write scope of source {source_id}")]
  Contention {
    source_id: SourceId,
    waited:    Duration,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Classify for Error {
  fn class(&self) -> ErrorClass {
    match self {
      Error::Core(e) => e.class(),
      Error::Contention { .. } => ErrorClass::Contention,
      Error::Database(e) if is_unavailable(e) => ErrorClass::Unavailable,
      Error::Database(_)
      | Error::Json(_)
      | Error::Uuid(_)
      | Error::DateParse(_) => ErrorClass::Internal,
    }
  }
}

/// Busy/locked databases and a dead connection thread are transient.
fn is_unavailable(e: &tokio_rusqlite::Error) -> bool {
  match e {
    tokio_rusqlite::Error::ConnectionClosed => true,
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(failure, _)) => matches!(
      failure.code,
      ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::CannotOpen
    ),
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sqlite_failure(code: i32) -> Error {
    Error::Database(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
      rusqlite::ffi::Error::new(code),
      None,
    )))
  }

  #[test]
  fn busy_database_is_retryable() {
    let err = sqlite_failure(rusqlite::ffi::SQLITE_BUSY);
    assert_eq!(err.class(), ErrorClass::Unavailable);
    assert!(err.is_retryable());
  }

  #[test]
  fn constraint_violation_is_not_retryable() {
    let err = sqlite_failure(rusqlite::ffi::SQLITE_CONSTRAINT);
    assert_eq!(err.class(), ErrorClass::Internal);
  }

  #[test]
  fn contention_is_retryable() {
    let err = Error::Contention {
      source_id: SourceId::from("s1"),
      waited:    Duration::from_millis(10),
    };
    assert!(err.is_retryable());
  }
}
