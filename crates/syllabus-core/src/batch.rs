//! Batch preparation: validation and intra-batch deduplication.
//!
//! Runs before any ledger mutation. Invalid rows are rejected individually
//! and never abort the rest of the batch. Rows sharing an identity key
//! collapse to the one that appears last in the input.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
  Error,
  course::{CourseRow, IdentityKey},
};

/// A row that did not make it into the merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRow {
  /// Position of the row in the submitted batch.
  pub index:  usize,
  pub code:   Option<String>,
  pub reason: String,
}

/// A validated row together with its identity key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRow {
  pub key: IdentityKey,
  pub row: CourseRow,
}

#[derive(Debug, Clone, Default)]
pub struct PreparedBatch {
  /// One entry per distinct identity key, in order of first appearance.
  pub rows:     Vec<PreparedRow>,
  pub rejected: Vec<RejectedRow>,
}

/// Outcome of merging one batch into the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
  pub inserted: usize,
  /// Existing records matched by identity key. An identical re-sighting
  /// still counts here, although it leaves the stored row untouched.
  pub updated:  usize,
  pub rejected: Vec<RejectedRow>,
}

impl PreparedBatch {
  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  /// Attach merge counts to this batch's rejections.
  pub fn into_report(self, inserted: usize, updated: usize) -> IngestReport {
    IngestReport { inserted, updated, rejected: self.rejected }
  }
}

/// Validate `rows` and collapse intra-batch duplicates (last write wins).
pub fn prepare(rows: Vec<CourseRow>) -> PreparedBatch {
  let mut batch = PreparedBatch::default();
  let mut slots: HashMap<IdentityKey, usize> = HashMap::with_capacity(rows.len());

  for (index, row) in rows.into_iter().enumerate() {
    if row.title.trim().is_empty() {
      batch.rejected.push(RejectedRow {
        index,
        code: row.code,
        reason: Error::EmptyTitle { index }.to_string(),
      });
      continue;
    }

    let key = row.identity_key();
    match slots.get(&key) {
      Some(&slot) => batch.rows[slot].row = row,
      None => {
        slots.insert(key.clone(), batch.rows.len());
        batch.rows.push(PreparedRow { key, row });
      }
    }
  }

  if !batch.rejected.is_empty() {
    tracing::debug!(rejected = batch.rejected.len(), "rows rejected during batch preparation");
  }

  batch
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_titles_are_rejected_individually() {
    let batch = prepare(vec![
      CourseRow::new(Some("A1"), "Algebra"),
      CourseRow::new(Some("B1"), ""),
      CourseRow::new(Some("C1"), "   "),
      CourseRow::new(Some("D1"), "Drawing"),
    ]);

    assert_eq!(batch.rows.len(), 2);
    assert_eq!(batch.rejected.len(), 2);
    assert_eq!(batch.rejected[0].index, 1);
    assert_eq!(batch.rejected[0].code.as_deref(), Some("B1"));
    assert_eq!(batch.rejected[1].index, 2);
    assert!(batch.rejected[1].reason.contains("title"));
  }

  #[test]
  fn later_duplicate_wins_and_keeps_first_position() {
    let batch = prepare(vec![
      CourseRow::new(None, "A").with_description("first"),
      CourseRow::new(Some("X"), "B"),
      CourseRow::new(Some(""), "A").with_description("second"),
    ]);

    assert_eq!(batch.rows.len(), 2);
    assert_eq!(batch.rows[0].key.title(), "A");
    assert_eq!(batch.rows[0].row.description.as_deref(), Some("second"));
    assert_eq!(batch.rows[1].key.code(), "X");
    assert!(batch.rejected.is_empty());
  }

  #[test]
  fn rows_without_titles_from_json_are_rejected_in_place() {
    let rows: Vec<CourseRow> = serde_json::from_str(
      r#"[{"code":"A","title":null},{"code":"B"},{"code":"C","title":"Kept"}]"#,
    )
    .unwrap();
    let batch = prepare(rows);

    assert_eq!(batch.rows.len(), 1);
    assert_eq!(batch.rows[0].key.title(), "Kept");
    let indexes: Vec<_> = batch.rejected.iter().map(|r| r.index).collect();
    assert_eq!(indexes, [0, 1]);
  }

  #[test]
  fn all_invalid_batch_is_empty_but_reports_everything() {
    let batch = prepare(vec![CourseRow::new(None, ""), CourseRow::new(None, "")]);
    assert!(batch.is_empty());

    let report = batch.into_report(0, 0);
    assert_eq!(report.inserted, 0);
    assert_eq!(report.rejected.len(), 2);
  }
}
