//! Read-side projections: performance listing, per-source status, course
//! preview, and the named `dashboard_*` views.
//!
//! Every function here runs inside a single `Connection::call` and never
//! touches the per-source write scopes. Results reflect whatever is
//! committed at the time of the read.

use rusqlite::{Connection, OptionalExtension as _};
use syllabus_core::view::{Row, VIEW_PREFIX};

use crate::encode::{RawRun, scalar_from_ref};

// ─── Performance listing ─────────────────────────────────────────────────────

/// Owned, pre-encoded form of a `PerformanceQuery`.
pub struct PerfParams {
  pub source_id:      Option<String>,
  pub source_name:    Option<String>,
  pub run_id:         Option<i64>,
  pub started_after:  Option<String>,
  pub started_before: Option<String>,
  /// Whitelisted column name (from `PerfSortField::column`).
  pub sort_column:    &'static str,
  /// `ASC` or `DESC`.
  pub direction:      &'static str,
  pub limit:          i64,
  pub offset:         i64,
}

const PERFORMANCE_PROJECTION: &str = "
SELECT p.*,
       CASE WHEN p.duration_secs > 0 THEN p.records_extracted / p.duration_secs ELSE 0.0 END
         AS records_per_sec,
       CASE WHEN p.duration_secs > 0 THEN p.urls_seen / p.duration_secs ELSE 0.0 END
         AS urls_per_sec
FROM (
  SELECT r.run_id,
         r.source_id,
         s.display_name AS source_name,
         r.urls_seen,
         r.records_extracted,
         r.concurrency,
         r.started_at,
         r.finished_at,
         MAX(0.0, ROUND((julianday(r.finished_at) - julianday(r.started_at)) * 86400.0, 3))
           AS duration_secs
  FROM runs r
  JOIN sources s ON s.source_id = r.source_id
) p";

pub fn performance(conn: &Connection, params: &PerfParams) -> rusqlite::Result<Vec<RawRun>> {
  let sql = format!(
    "SELECT * FROM ({PERFORMANCE_PROJECTION})
     WHERE (?1 IS NULL OR source_id   = ?1)
       AND (?2 IS NULL OR source_name = ?2)
       AND (?3 IS NULL OR run_id      = ?3)
       AND (?4 IS NULL OR started_at >= ?4)
       AND (?5 IS NULL OR started_at  < ?5)
     ORDER BY {col} {dir}, source_id ASC, run_id DESC
     LIMIT ?6 OFFSET ?7",
    col = params.sort_column,
    dir = params.direction,
  );

  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt
    .query_map(
      rusqlite::params![
        params.source_id,
        params.source_name,
        params.run_id,
        params.started_after,
        params.started_before,
        params.limit,
        params.offset,
      ],
      RawRun::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── Per-source status ───────────────────────────────────────────────────────

pub struct RawStatus {
  pub source_id:    String,
  pub display_name: String,
  pub school:       String,
  pub enabled:      bool,
  pub has_schema:   bool,
  pub course_count: i64,
  pub run_count:    i64,
  pub last_run_at:  Option<String>,
  pub url_count:    i64,
}

pub fn source_status(conn: &Connection) -> rusqlite::Result<Vec<RawStatus>> {
  let mut stmt = conn.prepare(
    "SELECT s.source_id,
            s.display_name,
            s.school,
            s.enabled,
            EXISTS (SELECT 1 FROM schemas sc WHERE sc.source_id = s.source_id),
            (SELECT COUNT(*) FROM courses c WHERE c.source_id = s.source_id),
            (SELECT COUNT(*) FROM runs r WHERE r.source_id = s.source_id),
            (SELECT MAX(r.finished_at) FROM runs r WHERE r.source_id = s.source_id),
            COALESCE(
              (SELECT r.urls_seen FROM runs r
                WHERE r.source_id = s.source_id
                ORDER BY r.run_id DESC LIMIT 1),
              0)
     FROM sources s
     ORDER BY s.display_name, s.source_id",
  )?;

  let rows = stmt
    .query_map([], |row| {
      Ok(RawStatus {
        source_id:    row.get(0)?,
        display_name: row.get(1)?,
        school:       row.get(2)?,
        enabled:      row.get(3)?,
        has_schema:   row.get(4)?,
        course_count: row.get(5)?,
        run_count:    row.get(6)?,
        last_run_at:  row.get(7)?,
        url_count:    row.get(8)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── Course preview ──────────────────────────────────────────────────────────

pub struct RawPreviewCourse {
  pub code:        String,
  pub title:       String,
  pub description: Option<String>,
  pub credits:     Option<String>,
  pub created_at:  String,
}

pub struct RawPreview {
  pub display_name:   String,
  pub distinct_count: i64,
  pub sample:         Vec<RawPreviewCourse>,
}

/// Deduplicated sample across every source sharing `source_id`'s school.
/// Returns `None` when the source is not registered.
pub fn course_preview(
  conn: &Connection,
  source_id: &str,
  limit: i64,
) -> rusqlite::Result<Option<RawPreview>> {
  let Some((display_name, school)) = conn
    .query_row(
      "SELECT display_name, school FROM sources WHERE source_id = ?1",
      [source_id],
      |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
    )
    .optional()?
  else {
    return Ok(None);
  };

  let distinct_count: i64 = conn.query_row(
    "SELECT COUNT(*) FROM (
       SELECT 1
       FROM courses c
       JOIN sources s ON s.source_id = c.source_id
       WHERE s.school = ?1
       GROUP BY c.code, c.title
     )",
    [&school],
    |row| row.get(0),
  )?;

  // Bare columns next to MAX() come from the row holding the maximum.
  let mut stmt = conn.prepare(
    "SELECT c.code, c.title, c.description, c.credits, MAX(c.created_at) AS latest_created_at
     FROM courses c
     JOIN sources s ON s.source_id = c.source_id
     WHERE s.school = ?1
     GROUP BY c.code, c.title
     ORDER BY latest_created_at DESC, c.title ASC
     LIMIT ?2",
  )?;
  let sample = stmt
    .query_map(rusqlite::params![school, limit], |row| {
      Ok(RawPreviewCourse {
        code:        row.get(0)?,
        title:       row.get(1)?,
        description: row.get(2)?,
        credits:     row.get(3)?,
        created_at:  row.get(4)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Some(RawPreview { display_name, distinct_count, sample }))
}

// ─── Named views ─────────────────────────────────────────────────────────────

pub fn list_views(conn: &Connection) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare(
    "SELECT name FROM sqlite_master
     WHERE type = 'view' AND substr(name, 1, length(?1)) = ?1
     ORDER BY name",
  )?;
  let names = stmt
    .query_map([VIEW_PREFIX], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(names)
}

/// First column named `ts` or ending in `_ts`, by ordinal position.
fn timestamp_column(conn: &Connection, view: &str) -> rusqlite::Result<Option<String>> {
  let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
  let columns = stmt
    .query_map([view], |row| row.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(columns.into_iter().find(|c| c == "ts" || c.ends_with("_ts")))
}

fn quote_ident(ident: &str) -> String { format!("\"{}\"", ident.replace('"', "\"\"")) }

/// `SELECT *` from a named view. Unknown names yield `None`.
pub fn fetch_view(conn: &Connection, name: &str, limit: i64) -> rusqlite::Result<Option<Vec<Row>>> {
  if !list_views(conn)?.iter().any(|v| v == name) {
    return Ok(None);
  }

  let sql = match timestamp_column(conn, name)? {
    Some(col) => format!(
      "SELECT * FROM {} ORDER BY {} DESC LIMIT ?1",
      quote_ident(name),
      quote_ident(&col)
    ),
    None => format!("SELECT * FROM {} LIMIT ?1", quote_ident(name)),
  };

  let mut stmt = conn.prepare(&sql)?;
  let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_owned).collect();
  let rows = stmt
    .query_map([limit], |row| {
      let mut out = Row::new();
      for (i, column) in columns.iter().enumerate() {
        out.insert(column.clone(), scalar_from_ref(row.get_ref(i)?));
      }
      Ok(out)
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Some(rows))
}
