//! Run metrics: append-only performance facts, one per harvest run.
//!
//! A run is never updated or deleted after it is recorded. Throughput is
//! derived on read from the stored counts and timing.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::{Error, Result, source::SourceId};

// ─── Writes ──────────────────────────────────────────────────────────────────

/// A run report as submitted by the harvester. The run id is assigned by the
/// store (one greater than the source's latest run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRun {
  #[serde(default)]
  pub urls_seen:         u64,
  #[serde(default)]
  pub records_extracted: u64,
  /// Concurrency slots observed during the run.
  #[serde(default)]
  pub concurrency:       u32,
  pub started_at:        DateTime<Utc>,
  pub finished_at:       DateTime<Utc>,
}

impl NewRun {
  pub fn validate(&self) -> Result<()> {
    if self.finished_at < self.started_at {
      return Err(Error::RunFinishedBeforeStart {
        started_at:  self.started_at,
        finished_at: self.finished_at,
      });
    }
    Ok(())
  }
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// One row of the performance listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
  pub run_id:            i64,
  pub source_id:         SourceId,
  pub source_name:       String,
  pub urls_seen:         u64,
  pub records_extracted: u64,
  pub concurrency:       u32,
  pub started_at:        DateTime<Utc>,
  pub finished_at:       DateTime<Utc>,
  pub duration_secs:     f64,
  pub records_per_sec:   f64,
  pub urls_per_sec:      f64,
}

/// Sortable columns of the performance listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, IntoStaticStr, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PerfSortField {
  RunId,
  SourceId,
  SourceName,
  UrlsSeen,
  RecordsExtracted,
  Concurrency,
  StartedAt,
  #[default]
  FinishedAt,
  DurationSecs,
  RecordsPerSec,
  UrlsPerSec,
}

impl PerfSortField {
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s.trim()).map_err(|_| Error::UnknownSortField(s.to_owned()))
  }

  /// Column name in the listing projection; identical to the field name.
  pub fn column(self) -> &'static str { self.into() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  Asc,
  #[default]
  Desc,
}

impl SortOrder {
  pub fn sql(self) -> &'static str {
    match self {
      Self::Asc => "ASC",
      Self::Desc => "DESC",
    }
  }
}

pub const DEFAULT_PERFORMANCE_LIMIT: usize = 100;
pub const MAX_PERFORMANCE_LIMIT: usize = 1000;

/// Parameters for [`CatalogStore::performance`](crate::store::CatalogStore::performance).
#[derive(Debug, Clone, Default)]
pub struct PerformanceQuery {
  pub source_id:      Option<SourceId>,
  /// Matches the source's display name exactly.
  pub source_name:    Option<String>,
  pub run_id:         Option<i64>,
  /// Inclusive lower bound on `started_at`.
  pub started_after:  Option<DateTime<Utc>>,
  /// Exclusive upper bound on `started_at`.
  pub started_before: Option<DateTime<Utc>>,
  pub sort:           PerfSortField,
  pub order:          SortOrder,
  pub limit:          Option<usize>,
  pub offset:         Option<usize>,
}

impl PerformanceQuery {
  pub fn effective_limit(&self) -> usize {
    self
      .limit
      .unwrap_or(DEFAULT_PERFORMANCE_LIMIT)
      .clamp(1, MAX_PERFORMANCE_LIMIT)
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
  }

  #[test]
  fn run_finishing_before_start_is_invalid() {
    let run = NewRun {
      urls_seen:         10,
      records_extracted: 5,
      concurrency:       2,
      started_at:        at(10),
      finished_at:       at(10) - Duration::seconds(1),
    };
    assert!(matches!(run.validate(), Err(Error::RunFinishedBeforeStart { .. })));

    let zero_length = NewRun { finished_at: at(10), ..run };
    assert!(zero_length.validate().is_ok());
  }

  #[test]
  fn sort_field_parses_snake_case_names() {
    assert_eq!(PerfSortField::parse("records_per_sec").unwrap(), PerfSortField::RecordsPerSec);
    assert_eq!(PerfSortField::parse(" run_id ").unwrap(), PerfSortField::RunId);
    assert!(matches!(
      PerfSortField::parse("finished_at; DROP TABLE runs"),
      Err(Error::UnknownSortField(_))
    ));
  }

  #[test]
  fn column_is_the_snake_case_name() {
    assert_eq!(PerfSortField::RecordsPerSec.column(), "records_per_sec");
    assert_eq!(PerfSortField::default().column(), "finished_at");
  }

  #[test]
  fn limit_defaults_and_clamps() {
    let mut q = PerformanceQuery::default();
    assert_eq!(q.effective_limit(), DEFAULT_PERFORMANCE_LIMIT);
    assert_eq!(q.sort, PerfSortField::FinishedAt);
    assert_eq!(q.order, SortOrder::Desc);

    q.limit = Some(0);
    assert_eq!(q.effective_limit(), 1);
    q.limit = Some(50_000);
    assert_eq!(q.effective_limit(), MAX_PERFORMANCE_LIMIT);
  }
}
