//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with millisecond precision
//! and a `Z` suffix, so lexical order equals chronological order and SQLite's
//! date functions can parse them. UUIDs are hyphenated lowercase strings.
//! Schema payloads are compact JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::ValueRef;
use syllabus_core::{
  course::Course,
  run::RunMetrics,
  schema::Schema,
  source::{Source, SourceId},
  view::Scalar,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Millis, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

/// Current time truncated to what the store can represent.
pub fn now() -> DateTime<Utc> {
  let now = Utc::now();
  decode_dt(&encode_dt(now)).unwrap_or(now)
}

// ─── Course code ─────────────────────────────────────────────────────────────

/// The ledger stores an absent code as `''`.
pub fn decode_code(stored: String) -> Option<String> {
  if stored.is_empty() { None } else { Some(stored) }
}

// ─── Open rows ───────────────────────────────────────────────────────────────

pub fn scalar_from_ref(value: ValueRef<'_>) -> Scalar {
  match value {
    ValueRef::Null => Scalar::Null,
    ValueRef::Integer(i) => Scalar::Integer(i),
    ValueRef::Real(f) => Scalar::Real(f),
    ValueRef::Text(t) | ValueRef::Blob(t) => Scalar::Text(String::from_utf8_lossy(t).into_owned()),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `sources` row.
pub struct RawSource {
  pub source_id:    String,
  pub display_name: String,
  pub school:       String,
  pub enabled:      bool,
  pub created_at:   String,
}

impl RawSource {
  pub const COLUMNS: &'static str = "source_id, display_name, school, enabled, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      source_id:    row.get(0)?,
      display_name: row.get(1)?,
      school:       row.get(2)?,
      enabled:      row.get(3)?,
      created_at:   row.get(4)?,
    })
  }

  pub fn into_source(self) -> Result<Source> {
    Ok(Source {
      source_id:    SourceId::new(self.source_id),
      display_name: self.display_name,
      school:       self.school,
      enabled:      self.enabled,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `schemas` row.
pub struct RawSchema {
  pub source_id:  String,
  pub payload:    String,
  pub updated_at: String,
}

impl RawSchema {
  pub fn into_schema(self) -> Result<Schema> {
    Ok(Schema {
      source_id:  SourceId::new(self.source_id),
      payload:    serde_json::from_str(&self.payload)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `courses` row.
pub struct RawCourse {
  pub course_id:   String,
  pub source_id:   String,
  pub code:        String,
  pub title:       String,
  pub description: Option<String>,
  pub credits:     Option<String>,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawCourse {
  pub const COLUMNS: &'static str =
    "course_id, source_id, code, title, description, credits, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      course_id:   row.get(0)?,
      source_id:   row.get(1)?,
      code:        row.get(2)?,
      title:       row.get(3)?,
      description: row.get(4)?,
      credits:     row.get(5)?,
      created_at:  row.get(6)?,
      updated_at:  row.get(7)?,
    })
  }

  pub fn into_course(self) -> Result<Course> {
    Ok(Course {
      course_id:   decode_uuid(&self.course_id)?,
      source_id:   SourceId::new(self.source_id),
      code:        decode_code(self.code),
      title:       self.title,
      description: self.description,
      credits:     self.credits,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values of one row of the performance projection.
pub struct RawRun {
  pub run_id:            i64,
  pub source_id:         String,
  pub source_name:       String,
  pub urls_seen:         i64,
  pub records_extracted: i64,
  pub concurrency:       i64,
  pub started_at:        String,
  pub finished_at:       String,
  pub duration_secs:     f64,
  pub records_per_sec:   f64,
  pub urls_per_sec:      f64,
}

impl RawRun {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      run_id:            row.get("run_id")?,
      source_id:         row.get("source_id")?,
      source_name:       row.get("source_name")?,
      urls_seen:         row.get("urls_seen")?,
      records_extracted: row.get("records_extracted")?,
      concurrency:       row.get("concurrency")?,
      started_at:        row.get("started_at")?,
      finished_at:       row.get("finished_at")?,
      duration_secs:     row.get("duration_secs")?,
      records_per_sec:   row.get("records_per_sec")?,
      urls_per_sec:      row.get("urls_per_sec")?,
    })
  }

  pub fn into_metrics(self) -> Result<RunMetrics> {
    Ok(RunMetrics {
      run_id:            self.run_id,
      source_id:         SourceId::new(self.source_id),
      source_name:       self.source_name,
      urls_seen:         self.urls_seen.max(0) as u64,
      records_extracted: self.records_extracted.max(0) as u64,
      concurrency:       self.concurrency.clamp(0, i64::from(u32::MAX)) as u32,
      started_at:        decode_dt(&self.started_at)?,
      finished_at:       decode_dt(&self.finished_at)?,
      duration_secs:     self.duration_secs,
      records_per_sec:   self.records_per_sec,
      urls_per_sec:      self.urls_per_sec,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.with_ymd_and_hms(2025, 1, 9, 23, 59, 59).unwrap();
    let b = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
    assert_eq!(encode_dt(a), "2025-01-09T23:59:59.000Z");
    assert!(encode_dt(a) < encode_dt(b));
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn empty_code_decodes_as_absent() {
    assert_eq!(decode_code(String::new()), None);
    assert_eq!(decode_code("CS101".into()).as_deref(), Some("CS101"));
  }
}
