//! SQL schema for the Versa SQLite store.
//!
//! Executed on every open. The DDL is idempotent and stamps
//! `PRAGMA user_version`, which is never read back.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per (id, version). Rows are never deleted; only document_status
-- moves, and only out of 'PENDING'.
CREATE TABLE IF NOT EXISTS resource_versions (
    id              TEXT    NOT NULL,
    version_id      INTEGER NOT NULL CHECK (version_id > 0),
    resource_type   TEXT    NOT NULL,
    last_updated    TEXT    NOT NULL,   -- RFC 3339 UTC
    document_status TEXT    NOT NULL
        CHECK (document_status IN ('AVAILABLE', 'PENDING', 'DELETED')),
    payload_json    TEXT    NOT NULL,   -- JSON object
    PRIMARY KEY (id, version_id)
);

PRAGMA user_version = 1;
";
