//! Error types for `syllabus-core`.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("row {index}: title must not be empty")]
  EmptyTitle { index: usize },

  #[error("run finished at {finished_at} before it started at {started_at}")]
  RunFinishedBeforeStart {
    started_at:  DateTime<Utc>,
    finished_at: DateTime<Utc>,
  },

  #[error("unknown sort field: {0:?}")]
  UnknownSortField(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// Coarse failure category shared by every layer.
///
/// Callers use it to decide whether re-submitting the same request can
/// succeed. Re-submitting a course batch is always safe because the merge is
/// idempotent per identity key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
  /// The request itself is malformed (empty title, unknown source, ...).
  Validation,
  /// A referenced entity does not exist.
  NotFound,
  /// Timed out waiting for the per-source write scope.
  Contention,
  /// The storage layer is unreachable or busy.
  Unavailable,
  /// Anything else; not expected to succeed on retry.
  Internal,
}

impl ErrorClass {
  pub fn is_retryable(self) -> bool {
    matches!(self, Self::Contention | Self::Unavailable)
  }
}

/// Implemented by every error type that crosses a crate boundary, so upper
/// layers can classify backend errors without knowing the backend.
pub trait Classify {
  fn class(&self) -> ErrorClass;

  fn is_retryable(&self) -> bool { self.class().is_retryable() }
}

impl Classify for Error {
  fn class(&self) -> ErrorClass {
    match self {
      Error::EmptyTitle { .. }
      | Error::RunFinishedBeforeStart { .. }
      | Error::UnknownSortField(_) => ErrorClass::Validation,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_contention_and_unavailable_are_retryable() {
    assert!(ErrorClass::Contention.is_retryable());
    assert!(ErrorClass::Unavailable.is_retryable());
    assert!(!ErrorClass::Validation.is_retryable());
    assert!(!ErrorClass::NotFound.is_retryable());
    assert!(!ErrorClass::Internal.is_retryable());
  }

  #[test]
  fn empty_title_is_a_validation_error() {
    let err = Error::EmptyTitle { index: 3 };
    assert_eq!(err.class(), ErrorClass::Validation);
    assert!(!err.is_retryable());
    assert_eq!(err.to_string(), "row 3: title must not be empty");
  }
}
