//! Source: a harvest target (typically one school's course catalog).
//!
//! Sources are registered by the harvesting side. Everything else in the
//! catalog is scoped by [`SourceId`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque, globally unique identifier of a source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SourceId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for SourceId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for SourceId {
  fn from(s: String) -> Self { Self(s) }
}

/// A registered source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
  pub source_id:    SourceId,
  pub display_name: String,
  /// Cleaned grouping name; several sources may feed the same school.
  pub school:       String,
  pub enabled:      bool,
  pub created_at:   DateTime<Utc>,
}

/// Input for [`CatalogStore::register_source`](crate::store::CatalogStore::register_source).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSource {
  pub source_id:    SourceId,
  pub display_name: String,
  /// Defaults to [`school_slug`] of the display name.
  #[serde(default)]
  pub school:       Option<String>,
  #[serde(default = "default_enabled")]
  pub enabled:      bool,
}

fn default_enabled() -> bool { true }

impl NewSource {
  pub fn new(source_id: impl Into<SourceId>, display_name: impl Into<String>) -> Self {
    Self {
      source_id:    source_id.into(),
      display_name: display_name.into(),
      school:       None,
      enabled:      true,
    }
  }

  /// The school this source groups under.
  pub fn resolved_school(&self) -> String {
    match self.school.as_deref().map(str::trim) {
      Some(s) if !s.is_empty() => s.to_owned(),
      _ => school_slug(&self.display_name),
    }
  }
}

/// Lowercase, underscore-separated form of a display name.
///
/// `"St. Olaf College"` becomes `"st_olaf_college"`.
pub fn school_slug(display_name: &str) -> String {
  let mut out = String::with_capacity(display_name.len());
  let mut pending_sep = false;
  for c in display_name.chars() {
    if c.is_alphanumeric() {
      if pending_sep && !out.is_empty() {
        out.push('_');
      }
      pending_sep = false;
      out.extend(c.to_lowercase());
    } else if c.is_whitespace() || c == '-' || c == '_' {
      pending_sep = true;
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn slug_collapses_punctuation_and_spaces() {
    assert_eq!(school_slug("St. Olaf College"), "st_olaf_college");
    assert_eq!(school_slug("  Texas A&M -- Main "), "texas_am_main");
    assert_eq!(school_slug(""), "");
  }

  #[test]
  fn explicit_school_wins_over_slug() {
    let mut input = NewSource::new("mit-ocw", "MIT OpenCourseWare");
    assert_eq!(input.resolved_school(), "mit_opencourseware");

    input.school = Some("mit".into());
    assert_eq!(input.resolved_school(), "mit");

    input.school = Some("   ".into());
    assert_eq!(input.resolved_school(), "mit_opencourseware");
  }

  #[test]
  fn source_id_serializes_as_plain_string() {
    let id = SourceId::from("uni-1");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"uni-1\"");
  }
}
