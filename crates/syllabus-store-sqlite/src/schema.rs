//! SQL schema for the Syllabus SQLite store.
//!
//! Applied at connection startup when `PRAGMA user_version` is behind
//! [`SCHEMA_VERSION`]. Future migrations will be gated on that number.

pub const SCHEMA_VERSION: i64 = 1;

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sources (
    source_id    TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    school       TEXT NOT NULL,
    enabled      INTEGER NOT NULL DEFAULT 1,
    created_at   TEXT NOT NULL
);

-- At most one live schema per source; rows are replaced in place.
CREATE TABLE IF NOT EXISTS schemas (
    source_id  TEXT PRIMARY KEY REFERENCES sources(source_id),
    payload    TEXT NOT NULL,   -- opaque JSON document
    updated_at TEXT NOT NULL
);

-- The ledger. Identity within a source is (code, title); an absent code is
-- stored as ''. The unique index backs the per-source merge scope.
CREATE TABLE IF NOT EXISTS courses (
    course_id   TEXT PRIMARY KEY,
    source_id   TEXT NOT NULL REFERENCES sources(source_id),
    code        TEXT NOT NULL DEFAULT '',
    title       TEXT NOT NULL CHECK (length(trim(title)) > 0),
    description TEXT,
    credits     TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    UNIQUE (source_id, code, title)
);

-- Run metrics are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS runs (
    source_id         TEXT NOT NULL REFERENCES sources(source_id),
    run_id            INTEGER NOT NULL,
    urls_seen         INTEGER NOT NULL,
    records_extracted INTEGER NOT NULL,
    concurrency       INTEGER NOT NULL,
    started_at        TEXT NOT NULL,
    finished_at       TEXT NOT NULL,
    PRIMARY KEY (source_id, run_id)
);

CREATE INDEX IF NOT EXISTS sources_school_idx  ON sources(school);
CREATE INDEX IF NOT EXISTS courses_created_idx ON courses(source_id, created_at);
CREATE INDEX IF NOT EXISTS runs_finished_idx   ON runs(finished_at);

-- Named views. Anything prefixed `dashboard_` is listed by the read API;
-- the first column ending in `ts` orders the rows, newest first.
CREATE VIEW IF NOT EXISTS dashboard_course_counts AS
    SELECT s.source_id,
           s.display_name,
           s.school,
           COUNT(c.course_id) AS course_count,
           MAX(c.updated_at)  AS last_update_ts
    FROM sources s
    LEFT JOIN courses c ON c.source_id = s.source_id
    GROUP BY s.source_id;

CREATE VIEW IF NOT EXISTS dashboard_recent_runs AS
    SELECT r.source_id,
           s.display_name,
           r.run_id,
           r.urls_seen,
           r.records_extracted,
           r.concurrency,
           r.started_at  AS start_ts,
           r.finished_at AS finish_ts
    FROM runs r
    JOIN sources s ON s.source_id = r.source_id;

CREATE VIEW IF NOT EXISTS dashboard_schema_coverage AS
    SELECT s.source_id,
           s.display_name,
           s.enabled,
           sc.source_id IS NOT NULL AS has_schema,
           sc.updated_at            AS schema_ts
    FROM sources s
    LEFT JOIN schemas sc ON sc.source_id = s.source_id;

PRAGMA user_version = 1;
";
