//! Schema-on-read projections.
//!
//! Named views return rows as open mappings; consumers must inspect keys
//! rather than assume a fixed column list. The key set is stable within a
//! single response.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Open rows ───────────────────────────────────────────────────────────────

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
}

impl Scalar {
  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Self::Integer(i) => Some(*i),
      _ => None,
    }
  }
}

/// Field name → scalar.
pub type Row = BTreeMap<String, Scalar>;

/// Prefix shared by every named view exposed to consumers.
pub const VIEW_PREFIX: &str = "dashboard_";

pub const DEFAULT_VIEW_LIMIT: usize = 100;
pub const MAX_VIEW_LIMIT: usize = 1000;

// ─── Course preview ──────────────────────────────────────────────────────────

pub const DEFAULT_PREVIEW_LIMIT: usize = 5;
pub const MAX_PREVIEW_LIMIT: usize = 50;
/// Characters of description included in a preview.
pub const DESCRIPTION_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewCourse {
  pub code:                Option<String>,
  pub title:               Option<String>,
  pub description_preview: Option<String>,
  pub credits:             Option<String>,
  pub created_at:          Option<DateTime<Utc>>,
}

/// A deduplicated sample of a school's courses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoursePreview {
  /// `None` when the source is not registered.
  pub source_display_name:   Option<String>,
  pub distinct_course_count: u64,
  pub sample:                Vec<PreviewCourse>,
}

/// First [`DESCRIPTION_PREVIEW_CHARS`] characters of `description`.
pub fn description_preview(description: &str) -> String {
  match description.char_indices().nth(DESCRIPTION_PREVIEW_CHARS) {
    Some((cut, _)) => description[..cut].to_owned(),
    None => description.to_owned(),
  }
}
