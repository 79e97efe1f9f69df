//! Course records: the canonical, deduplicated entries of the ledger.
//!
//! A record's identity within its source is the pair
//! `(normalized code, title)`. Everything else is mutable and refreshed on
//! every later sighting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::source::SourceId;

// ─── Input ───────────────────────────────────────────────────────────────────

/// One extracted row as delivered by the harvester.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRow {
  #[serde(default)]
  pub code:        Option<String>,
  /// A missing or `null` title reads as empty and is rejected per row.
  #[serde(default, deserialize_with = "null_as_empty")]
  pub title:       String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub credits:     Option<String>,
}

impl CourseRow {
  pub fn new(code: Option<&str>, title: impl Into<String>) -> Self {
    Self {
      code: code.map(str::to_owned),
      title: title.into(),
      ..Self::default()
    }
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  pub fn with_credits(mut self, credits: impl Into<String>) -> Self {
    self.credits = Some(credits.into());
    self
  }

  pub fn identity_key(&self) -> IdentityKey {
    IdentityKey::new(self.code.as_deref(), &self.title)
  }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
  Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// `(normalized code, title)`. An absent code and an empty code are equal;
/// the title is compared exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
  code:  String,
  title: String,
}

impl IdentityKey {
  pub fn new(code: Option<&str>, title: &str) -> Self {
    Self {
      code:  normalize_code(code).to_owned(),
      title: title.to_owned(),
    }
  }

  /// The normalized code; empty when the course has none.
  pub fn code(&self) -> &str { &self.code }

  pub fn title(&self) -> &str { &self.title }
}

pub fn normalize_code(code: Option<&str>) -> &str { code.unwrap_or("") }

// ─── Stored record ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
  pub course_id:   Uuid,
  pub source_id:   SourceId,
  pub code:        Option<String>,
  pub title:       String,
  pub description: Option<String>,
  pub credits:     Option<String>,
  pub created_at:  DateTime<Utc>,
  /// Moves only when a mutable field actually changes.
  pub updated_at:  DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn absent_and_empty_code_share_identity() {
    let a = CourseRow::new(None, "Intro");
    let b = CourseRow::new(Some(""), "Intro");
    assert_eq!(a.identity_key(), b.identity_key());
  }

  #[test]
  fn title_is_compared_exactly() {
    let a = CourseRow::new(Some("CS101"), "Intro");
    let b = CourseRow::new(Some("CS101"), "Intro ");
    let c = CourseRow::new(Some("CS101"), "intro");
    assert_ne!(a.identity_key(), b.identity_key());
    assert_ne!(a.identity_key(), c.identity_key());
  }

  #[test]
  fn description_is_not_part_of_identity() {
    let a = CourseRow::new(Some("CS101"), "Intro").with_description("v1");
    let b = CourseRow::new(Some("CS101"), "Intro").with_description("v2");
    assert_eq!(a.identity_key(), b.identity_key());
  }

  #[test]
  fn row_deserializes_with_missing_optionals() {
    let row: CourseRow = serde_json::from_str(r#"{"title":"A"}"#).unwrap();
    assert_eq!(row, CourseRow::new(None, "A"));

    let row: CourseRow =
      serde_json::from_str(r#"{"code":null,"title":"A","description":"d"}"#).unwrap();
    assert_eq!(row.description.as_deref(), Some("d"));
  }

  #[test]
  fn null_or_missing_title_reads_as_empty() {
    let row: CourseRow = serde_json::from_str(r#"{"code":"A","title":null}"#).unwrap();
    assert_eq!(row, CourseRow::new(Some("A"), ""));

    let row: CourseRow = serde_json::from_str(r#"{"code":"B"}"#).unwrap();
    assert_eq!(row.title, "");
  }
}
