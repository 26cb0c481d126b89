//! SQL schema for the Daily Facts SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS facts (
    fact_id     TEXT PRIMARY KEY,
    text        TEXT NOT NULL,
    category    TEXT NOT NULL,            -- canonical lowercase name
    source      TEXT,
    tags        TEXT NOT NULL DEFAULT '[]',
    date_added  TEXT NOT NULL,            -- RFC 3339 UTC, millisecond precision
    hidden      INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS facts_category_idx ON facts(category);
CREATE INDEX IF NOT EXISTS facts_added_idx    ON facts(date_added);

-- Agent-side state: one JSON value per key.
CREATE TABLE IF NOT EXISTS kv (
    key         TEXT PRIMARY KEY,
    value_json  TEXT NOT NULL
);

PRAGMA user_version = 1;
";
