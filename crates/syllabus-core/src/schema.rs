//! Extraction schema: the single current document per source.
//!
//! The payload is opaque to the catalog. Writing a schema replaces the
//! previous one in place; no history is kept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::source::SourceId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
  pub source_id:  SourceId,
  pub payload:    serde_json::Value,
  pub updated_at: DateTime<Utc>,
}
