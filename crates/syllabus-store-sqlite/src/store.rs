//! [`SqliteStore`]: the SQLite implementation of [`CatalogStore`].

use std::{path::Path, sync::Arc, time::Duration};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use syllabus_core::{
  batch::{self, IngestReport},
  course::{Course, CourseRow},
  run::{NewRun, PerformanceQuery, RunMetrics},
  schema::Schema,
  source::{NewSource, Source, SourceId},
  status::{SourceStatus, StatusInputs, StatusPolicy, derive_status},
  store::CatalogStore,
  view::{CoursePreview, PreviewCourse, Row, description_preview},
};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{RawCourse, RawSchema, RawSource, decode_code, decode_dt, encode_dt, encode_uuid, now},
  locks::SourceLocks,
  schema::{SCHEMA, SCHEMA_VERSION},
  views::{self, PerfParams},
};

// ─── Options ─────────────────────────────────────────────────────────────────

/// Tunables for [`SqliteStore`].
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
  /// Longest wait for a source's write scope before failing with
  /// [`Error::Contention`].
  pub lock_timeout: Duration,
  /// SQLite `busy_timeout` for storage-level locks.
  pub busy_timeout: Duration,
}

impl Default for StoreOptions {
  fn default() -> Self {
    Self {
      lock_timeout: Duration::from_secs(5),
      busy_timeout: Duration::from_secs(5),
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A course catalog backed by a single SQLite file.
///
/// Cloning is cheap: the connection and the lock table are
/// reference-counted, and clones share both.
#[derive(Clone)]
pub struct SqliteStore {
  conn:  tokio_rusqlite::Connection,
  locks: Arc<SourceLocks>,
}

/// A course row flattened into its column values.
struct EncodedRow {
  code:        String,
  title:       String,
  description: Option<String>,
  credits:     Option<String>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with(path, StoreOptions::default()).await
  }

  pub async fn open_with(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn, options).await
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    Self::open_in_memory_with(StoreOptions::default()).await
  }

  pub async fn open_in_memory_with(options: StoreOptions) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn, options).await
  }

  async fn init(conn: tokio_rusqlite::Connection, options: StoreOptions) -> Result<Self> {
    let busy_timeout = options.busy_timeout;
    let previous: i64 = conn
      .call(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
          row.get::<_, String>(0)
        })?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version < SCHEMA_VERSION {
          conn.execute_batch(SCHEMA)?;
        }
        Ok(version)
      })
      .await?;

    if previous < SCHEMA_VERSION {
      tracing::info!(from = previous, to = SCHEMA_VERSION, "catalog schema initialised");
    }

    Ok(Self {
      conn,
      locks: Arc::new(SourceLocks::new(options.lock_timeout)),
    })
  }

  /// Hold the write scope of `id`; used by tests to simulate a stuck merge.
  #[cfg(test)]
  pub(crate) async fn hold_source(&self, id: &SourceId) -> Result<tokio::sync::OwnedSemaphorePermit> {
    self.locks.acquire(id).await
  }
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = Error;

  // ── Source registry ───────────────────────────────────────────────────────

  async fn register_source(&self, input: NewSource) -> Result<Source> {
    let id_str   = input.source_id.to_string();
    let school   = input.resolved_school();
    let name     = input.display_name;
    let enabled  = input.enabled;
    let at_str   = encode_dt(now());

    let raw: RawSource = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "INSERT INTO sources (source_id, display_name, school, enabled, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (source_id) DO UPDATE SET
             display_name = excluded.display_name,
             school       = excluded.school,
             enabled      = excluded.enabled
           RETURNING {}",
          RawSource::COLUMNS
        );
        Ok(conn.query_row(
          &sql,
          rusqlite::params![id_str, name, school, enabled, at_str],
          RawSource::from_row,
        )?)
      })
      .await?;

    raw.into_source()
  }

  async fn get_source(&self, id: SourceId) -> Result<Option<Source>> {
    let id_str = id.to_string();

    let raw: Option<RawSource> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {} FROM sources WHERE source_id = ?1", RawSource::COLUMNS);
        Ok(conn.query_row(&sql, [id_str], RawSource::from_row).optional()?)
      })
      .await?;

    raw.map(RawSource::into_source).transpose()
  }

  async fn list_sources(&self) -> Result<Vec<Source>> {
    let raws: Vec<RawSource> = self
      .conn
      .call(|conn| {
        let sql = format!(
          "SELECT {} FROM sources ORDER BY display_name, source_id",
          RawSource::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawSource::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSource::into_source).collect()
  }

  // ── Schema store ──────────────────────────────────────────────────────────

  async fn put_schema(&self, id: SourceId, payload: serde_json::Value) -> Result<Schema> {
    let schema = Schema { source_id: id, payload, updated_at: now() };

    let id_str      = schema.source_id.to_string();
    let payload_str = serde_json::to_string(&schema.payload)?;
    let at_str      = encode_dt(schema.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO schemas (source_id, payload, updated_at) VALUES (?1, ?2, ?3)
           ON CONFLICT (source_id) DO UPDATE SET
             payload    = excluded.payload,
             updated_at = excluded.updated_at",
          rusqlite::params![id_str, payload_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(schema)
  }

  async fn get_schema(&self, id: SourceId) -> Result<Option<Schema>> {
    let id_str = id.to_string();

    let raw: Option<RawSchema> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT source_id, payload, updated_at FROM schemas WHERE source_id = ?1",
            [id_str],
            |row| {
              Ok(RawSchema {
                source_id:  row.get(0)?,
                payload:    row.get(1)?,
                updated_at: row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSchema::into_schema).transpose()
  }

  // ── Catalog ledger ────────────────────────────────────────────────────────

  async fn ingest_batch(&self, id: SourceId, rows: Vec<CourseRow>) -> Result<IngestReport> {
    let prepared = batch::prepare(rows);
    if prepared.is_empty() {
      return Ok(prepared.into_report(0, 0));
    }

    let encoded: Vec<EncodedRow> = prepared
      .rows
      .iter()
      .map(|p| EncodedRow {
        code:        p.key.code().to_owned(),
        title:       p.key.title().to_owned(),
        description: p.row.description.clone(),
        credits:     p.row.credits.clone(),
      })
      .collect();
    let id_str = id.to_string();
    let at_str = encode_dt(now());

    // Held until the transaction below has committed.
    let _scope = self.locks.acquire(&id).await?;

    let (inserted, updated) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut inserted = 0usize;
        let mut updated  = 0usize;
        {
          let mut find = tx.prepare_cached(
            "SELECT course_id FROM courses WHERE source_id = ?1 AND code = ?2 AND title = ?3",
          )?;
          // Only touch the row when a mutable field actually changes.
          let mut refresh = tx.prepare_cached(
            "UPDATE courses SET description = ?2, credits = ?3, updated_at = ?4
             WHERE course_id = ?1 AND (description IS NOT ?2 OR credits IS NOT ?3)",
          )?;
          let mut insert = tx.prepare_cached(
            "INSERT INTO courses (
               course_id, source_id, code, title, description, credits, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
          )?;

          for row in &encoded {
            let existing: Option<String> = find
              .query_row(rusqlite::params![id_str, row.code, row.title], |r| r.get(0))
              .optional()?;

            match existing {
              Some(course_id) => {
                refresh.execute(rusqlite::params![
                  course_id,
                  row.description,
                  row.credits,
                  at_str,
                ])?;
                updated += 1;
              }
              None => {
                insert.execute(rusqlite::params![
                  encode_uuid(Uuid::new_v4()),
                  id_str,
                  row.code,
                  row.title,
                  row.description,
                  row.credits,
                  at_str,
                ])?;
                inserted += 1;
              }
            }
          }
        }
        tx.commit()?;
        Ok((inserted, updated))
      })
      .await?;

    tracing::debug!(source_id = %id, inserted, updated, "course batch merged");
    Ok(prepared.into_report(inserted, updated))
  }

  async fn list_courses(&self, id: SourceId, limit: usize, offset: usize) -> Result<Vec<Course>> {
    let id_str     = id.to_string();
    let limit_val  = i64::try_from(limit).unwrap_or(i64::MAX);
    let offset_val = i64::try_from(offset).unwrap_or(i64::MAX);

    let raws: Vec<RawCourse> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM courses WHERE source_id = ?1
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?2 OFFSET ?3",
          RawCourse::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str, limit_val, offset_val], RawCourse::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCourse::into_course).collect()
  }

  // ── Run metrics ───────────────────────────────────────────────────────────

  async fn record_run(&self, id: SourceId, run: NewRun) -> Result<RunMetrics> {
    run.validate()?;

    let id_str      = id.to_string();
    let urls        = i64::try_from(run.urls_seen).unwrap_or(i64::MAX);
    let records     = i64::try_from(run.records_extracted).unwrap_or(i64::MAX);
    let concurrency = i64::from(run.concurrency);
    let started     = encode_dt(run.started_at);
    let finished    = encode_dt(run.finished_at);

    let run_id: i64 = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let run_id: i64 = tx.query_row(
          "SELECT COALESCE(MAX(run_id), 0) + 1 FROM runs WHERE source_id = ?1",
          [&id_str],
          |row| row.get(0),
        )?;
        tx.execute(
          "INSERT INTO runs (
             source_id, run_id, urls_seen, records_extracted, concurrency,
             started_at, finished_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, run_id, urls, records, concurrency, started, finished],
        )?;
        tx.commit()?;
        Ok(run_id)
      })
      .await?;

    let query = PerformanceQuery {
      source_id: Some(id),
      run_id: Some(run_id),
      limit: Some(1),
      ..PerformanceQuery::default()
    };
    self
      .performance(&query)
      .await?
      .pop()
      .ok_or(Error::Database(tokio_rusqlite::Error::Rusqlite(
        rusqlite::Error::QueryReturnedNoRows,
      )))
  }

  // ── Aggregation views ─────────────────────────────────────────────────────

  async fn performance<'a>(&'a self, query: &'a PerformanceQuery) -> Result<Vec<RunMetrics>> {
    let params = PerfParams {
      source_id:      query.source_id.as_ref().map(SourceId::to_string),
      source_name:    query.source_name.clone(),
      run_id:         query.run_id,
      started_after:  query.started_after.map(encode_dt),
      started_before: query.started_before.map(encode_dt),
      sort_column:    query.sort.column(),
      direction:      query.order.sql(),
      limit:          i64::try_from(query.effective_limit()).unwrap_or(i64::MAX),
      offset:         i64::try_from(query.offset.unwrap_or(0)).unwrap_or(i64::MAX),
    };

    let raws = self
      .conn
      .call(move |conn| Ok(views::performance(conn, &params)?))
      .await?;

    raws.into_iter().map(|raw| raw.into_metrics()).collect()
  }

  async fn source_status(&self, policy: StatusPolicy) -> Result<Vec<SourceStatus>> {
    let raws = self
      .conn
      .call(|conn| Ok(views::source_status(conn)?))
      .await?;

    let now = Utc::now();
    raws
      .into_iter()
      .map(|raw| {
        let last_run_at = raw.last_run_at.as_deref().map(decode_dt).transpose()?;
        let inputs = StatusInputs {
          has_schema:   raw.has_schema,
          course_count: raw.course_count.max(0) as u64,
          run_count:    raw.run_count.max(0) as u64,
          last_run_at,
        };
        let (status, indicator) = derive_status(&inputs, now, &policy);
        Ok(SourceStatus {
          source_id:    SourceId::new(raw.source_id),
          display_name: raw.display_name,
          school:       raw.school,
          enabled:      raw.enabled,
          has_schema:   inputs.has_schema,
          url_count:    raw.url_count.max(0) as u64,
          course_count: inputs.course_count,
          run_count:    inputs.run_count,
          last_run_at,
          status,
          indicator,
        })
      })
      .collect()
  }

  async fn course_preview(&self, id: SourceId, limit: usize) -> Result<CoursePreview> {
    let id_str    = id.to_string();
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raw = self
      .conn
      .call(move |conn| Ok(views::course_preview(conn, &id_str, limit_val)?))
      .await?;

    let Some(raw) = raw else {
      return Ok(CoursePreview::default());
    };

    let sample = raw
      .sample
      .into_iter()
      .map(|c| {
        Ok(PreviewCourse {
          code:                decode_code(c.code),
          title:               Some(c.title),
          description_preview: c.description.as_deref().map(description_preview),
          credits:             c.credits,
          created_at:          Some(decode_dt(&c.created_at)?),
        })
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(CoursePreview {
      source_display_name:   Some(raw.display_name),
      distinct_course_count: raw.distinct_count.max(0) as u64,
      sample,
    })
  }

  // ── Named views ───────────────────────────────────────────────────────────

  async fn list_views(&self) -> Result<Vec<String>> {
    Ok(self.conn.call(|conn| Ok(views::list_views(conn)?)).await?)
  }

  async fn fetch_view(&self, name: String, limit: usize) -> Result<Option<Vec<Row>>> {
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);
    Ok(
      self
        .conn
        .call(move |conn| Ok(views::fetch_view(conn, &name, limit_val)?))
        .await?,
    )
  }
}
