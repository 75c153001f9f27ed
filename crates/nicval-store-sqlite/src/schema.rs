//! SQL schema for the nicval SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Both record tables share one column layout so reads can `UNION ALL` them.
/// `reason` is always NULL in `validated_nics`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS validated_nics (
    nic                  TEXT PRIMARY KEY,   -- upper-cased identifier
    kind                 TEXT NOT NULL,      -- 'single' | 'bulk'
    reason               TEXT,
    reported_eligibility TEXT,               -- 'eligible' | 'not_applicable'
    location_json        TEXT,               -- JSON-encoded IpInfo
    first_seen           TEXT NOT NULL,      -- RFC 3339 UTC, fixed width
    last_seen            TEXT NOT NULL,
    duplicate_count      INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS invalid_nics (
    nic                  TEXT PRIMARY KEY,
    kind                 TEXT NOT NULL,
    reason               TEXT,
    reported_eligibility TEXT,
    location_json        TEXT,
    first_seen           TEXT NOT NULL,
    last_seen            TEXT NOT NULL,
    duplicate_count      INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS uploaded_files (
    file_id       TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    first_created TEXT NOT NULL,
    nics_json     TEXT NOT NULL DEFAULT '[]'
);

CREATE INDEX IF NOT EXISTS validated_last_seen_idx ON validated_nics(last_seen);
CREATE INDEX IF NOT EXISTS invalid_last_seen_idx   ON invalid_nics(last_seen);
CREATE INDEX IF NOT EXISTS uploads_created_idx     ON uploaded_files(first_created);

PRAGMA user_version = 1;
";
