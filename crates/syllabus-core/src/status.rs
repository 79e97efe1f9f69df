//! Per-source status: a derived, never-stored read model.
//!
//! The label and indicator are a presentation policy over a handful of
//! counts. [`derive_status`] is pure so it can be tested without a store.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::source::SourceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StatusLabel {
  /// Courses present and a run finished inside the recent window.
  Complete,
  /// Courses present but no recent run.
  Stale,
  /// Schema generated, no courses yet.
  Pending,
  /// Runs recorded but neither schema nor courses.
  Failing,
  NotStarted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
  Green,
  Yellow,
  Red,
  Grey,
}

/// Thresholds for [`derive_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPolicy {
  /// A run finishing within this window of `now` counts as recent.
  pub recent_window: Duration,
}

impl Default for StatusPolicy {
  fn default() -> Self { Self { recent_window: Duration::days(7) } }
}

impl StatusPolicy {
  pub fn with_recent_days(days: i64) -> Self {
    Self { recent_window: Duration::days(days.max(0)) }
  }
}

/// The raw facts a status is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusInputs {
  pub has_schema:   bool,
  pub course_count: u64,
  pub run_count:    u64,
  pub last_run_at:  Option<DateTime<Utc>>,
}

pub fn derive_status(
  inputs: &StatusInputs,
  now: DateTime<Utc>,
  policy: &StatusPolicy,
) -> (StatusLabel, Indicator) {
  let recent = inputs
    .last_run_at
    .is_some_and(|at| now.signed_duration_since(at) <= policy.recent_window);

  if inputs.course_count > 0 {
    if recent {
      (StatusLabel::Complete, Indicator::Green)
    } else {
      (StatusLabel::Stale, Indicator::Yellow)
    }
  } else if inputs.has_schema {
    (StatusLabel::Pending, Indicator::Yellow)
  } else if inputs.run_count > 0 {
    (StatusLabel::Failing, Indicator::Red)
  } else {
    (StatusLabel::NotStarted, Indicator::Grey)
  }
}

/// One row of the per-source status view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceStatus {
  pub source_id:    SourceId,
  pub display_name: String,
  pub school:       String,
  pub enabled:      bool,
  pub has_schema:   bool,
  /// URLs seen by the most recent run.
  pub url_count:    u64,
  pub course_count: u64,
  pub run_count:    u64,
  pub last_run_at:  Option<DateTime<Utc>>,
  pub status:       StatusLabel,
  pub indicator:    Indicator,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
      .unwrap()
      .with_timezone(&Utc)
  }

  #[test]
  fn nothing_at_all_is_not_started() {
    let (label, ind) = derive_status(&StatusInputs::default(), now(), &StatusPolicy::default());
    assert_eq!(label, StatusLabel::NotStarted);
    assert_eq!(ind, Indicator::Grey);
  }

  #[test]
  fn courses_with_recent_run_are_complete() {
    let inputs = StatusInputs {
      has_schema:   true,
      course_count: 12,
      run_count:    1,
      last_run_at:  Some(now() - Duration::days(2)),
    };
    assert_eq!(
      derive_status(&inputs, now(), &StatusPolicy::default()),
      (StatusLabel::Complete, Indicator::Green)
    );
  }

  #[test]
  fn courses_without_recent_run_are_stale() {
    let old = StatusInputs {
      has_schema:   true,
      course_count: 12,
      run_count:    3,
      last_run_at:  Some(now() - Duration::days(30)),
    };
    assert_eq!(derive_status(&old, now(), &StatusPolicy::default()).0, StatusLabel::Stale);

    let never = StatusInputs { last_run_at: None, run_count: 0, ..old };
    assert_eq!(derive_status(&never, now(), &StatusPolicy::default()).0, StatusLabel::Stale);

    let wide = StatusPolicy::with_recent_days(60);
    assert_eq!(derive_status(&old, now(), &wide).0, StatusLabel::Complete);
  }

  #[test]
  fn schema_without_courses_is_pending() {
    let inputs = StatusInputs { has_schema: true, ..StatusInputs::default() };
    assert_eq!(
      derive_status(&inputs, now(), &StatusPolicy::default()),
      (StatusLabel::Pending, Indicator::Yellow)
    );
  }

  #[test]
  fn runs_without_schema_or_courses_are_failing() {
    let inputs = StatusInputs {
      run_count: 2,
      last_run_at: Some(now()),
      ..StatusInputs::default()
    };
    assert_eq!(
      derive_status(&inputs, now(), &StatusPolicy::default()),
      (StatusLabel::Failing, Indicator::Red)
    );
  }

  #[test]
  fn labels_serialize_snake_case() {
    assert_eq!(StatusLabel::NotStarted.to_string(), "not_started");
    assert_eq!(serde_json::to_string(&Indicator::Grey).unwrap(), "\"grey\"");
  }
}
