//! Schema DDL
//!
//! Column names stay compatible with the review UI that reads this database
//! (`action`, `backend`, `prompt`, `file_hash`, `last_hash`, ...).

use rusqlite::Connection;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    path TEXT NOT NULL UNIQUE,
    ext TEXT,
    first_seen TEXT,
    last_seen TEXT,
    last_hash TEXT
);

CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    host TEXT,
    pid INTEGER,
    config_json TEXT
);

CREATE TABLE IF NOT EXISTS actions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    file_id INTEGER NOT NULL REFERENCES files(id),
    action TEXT NOT NULL CHECK (action IN ('summarize', 'rewrite')),
    model TEXT,
    backend TEXT,
    prompt TEXT,
    file_hash TEXT,
    tokens_in INTEGER,
    tokens_out INTEGER,
    status TEXT NOT NULL CHECK (status IN ('ok', 'error')),
    error TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS summaries (
    action_id INTEGER PRIMARY KEY REFERENCES actions(id),
    summary TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS rewrites (
    action_id INTEGER PRIMARY KEY REFERENCES actions(id),
    rewrite TEXT NOT NULL,
    diff TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS applied_rewrites (
    action_id INTEGER PRIMARY KEY,
    applied_at TEXT,
    applied_by TEXT,
    backup_path TEXT,
    result TEXT,
    notes TEXT
);

CREATE TABLE IF NOT EXISTS queued_files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    path TEXT UNIQUE,
    requested_at TEXT,
    requested_by TEXT,
    notes TEXT,
    status TEXT DEFAULT 'pending'
);

CREATE INDEX IF NOT EXISTS idx_actions_file ON actions(file_id);
CREATE INDEX IF NOT EXISTS idx_actions_run ON actions(run_id);
CREATE INDEX IF NOT EXISTS idx_queued_files_status ON queued_files(status);

CREATE VIEW IF NOT EXISTS vw_last_actions AS
    SELECT a.*, f.path FROM actions a
    JOIN files f ON f.id = a.file_id
    WHERE a.id IN (SELECT MAX(id) FROM actions GROUP BY file_id);
";

/// Apply connection pragmas and create any missing tables, indexes and views.
/// Idempotent.
pub fn apply(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000;")?;
    conn.execute_batch(SCHEMA)
}
