use super::error::{StoreError, StoreResult};
use super::models::{
    ActionKind, ActionRecord, ActionStatus, FileRecord, LastAction, NewAction, QueueStatus,
    QueuedFile, RewriteRecord, RunRecord, StoreCounts,
};
use super::schema;
use crate::core::time::now_timestamp;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::str::FromStr;

pub struct Store {
    conn: Connection,
}

// id, path, requested_at, requested_by, notes, status
type QueuedRow = (
    i64,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn parse_column<T: FromStr>(column: &'static str, value: String) -> StoreResult<T> {
    T::from_str(&value).map_err(|_| StoreError::InvalidColumn { column, value })
}

impl Store {
    /// Open (or create) the database file and bring the schema up to date
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let conn = Connection::open(path)?;
        schema::apply(&conn)?;
        Ok(Self { conn })
    }

    /// Private in-memory database, used by tests and dry tooling
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        schema::apply(&conn)?;
        Ok(Self { conn })
    }

    // --- runs -------------------------------------------------------------

    pub fn begin_run(&self, host: &str, pid: u32, config_json: &str) -> StoreResult<i64> {
        self.conn.execute(
            "INSERT INTO runs (started_at, host, pid, config_json) VALUES (?1, ?2, ?3, ?4)",
            params![now_timestamp(), host, pid, config_json],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Set `finished_at`; returns false if it was already set
    pub fn finish_run(&self, run_id: i64) -> StoreResult<bool> {
        let updated = self.conn.execute(
            "UPDATE runs SET finished_at = ?1 WHERE id = ?2 AND finished_at IS NULL",
            params![now_timestamp(), run_id],
        )?;
        Ok(updated == 1)
    }

    pub fn run(&self, run_id: i64) -> StoreResult<Option<RunRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, host, pid, config_json
                 FROM runs WHERE id = ?1",
                params![run_id],
                |row| {
                    Ok(RunRecord {
                        id: row.get(0)?,
                        started_at: row.get(1)?,
                        finished_at: row.get(2)?,
                        host: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                        pid: row.get::<_, Option<u32>>(4)?.unwrap_or_default(),
                        config_json: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    // --- files ------------------------------------------------------------

    /// Insert the file on first sight, otherwise refresh `last_seen` and the
    /// hash. Rows are never deleted. Returns the file id.
    pub fn upsert_file(&self, path: &str, extension: &str, content_hash: &str) -> StoreResult<i64> {
        let now = now_timestamp();
        self.conn.execute(
            "INSERT INTO files (path, ext, first_seen, last_seen, last_hash)
             VALUES (?1, ?2, ?3, ?3, ?4)
             ON CONFLICT(path) DO UPDATE SET
                ext = excluded.ext,
                last_seen = excluded.last_seen,
                last_hash = excluded.last_hash",
            params![path, extension, now, content_hash],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM files WHERE path = ?1",
            params![path],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn file_by_path(&self, path: &str) -> StoreResult<Option<FileRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, path, ext, first_seen, last_seen, last_hash FROM files WHERE path = ?1",
                params![path],
                |row| {
                    Ok(FileRecord {
                        id: row.get(0)?,
                        path: row.get(1)?,
                        extension: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                        first_seen: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                        last_seen: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                        last_content_hash: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    // --- actions ----------------------------------------------------------

    pub fn insert_action(&self, action: &NewAction<'_>) -> StoreResult<i64> {
        self.conn.execute(
            "INSERT INTO actions (run_id, file_id, action, model, backend, prompt, file_hash,
                                  tokens_in, tokens_out, status, error, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                action.run_id,
                action.file_id,
                action.kind.as_ref(),
                action.model,
                action.backend_used,
                action.prompt_text,
                action.content_hash,
                action.tokens_in,
                action.tokens_out,
                action.status.as_ref(),
                action.error_text.unwrap_or(""),
                now_timestamp(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn actions_for_run(&self, run_id: i64) -> StoreResult<Vec<ActionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, file_id, action, model, backend, prompt, file_hash,
                    tokens_in, tokens_out, status, error, created_at
             FROM actions WHERE run_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, Option<i64>>(8)?,
                    row.get::<_, Option<i64>>(9)?,
                    row.get::<_, String>(10)?,
                    row.get::<_, Option<String>>(11)?,
                    row.get::<_, String>(12)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(
                    id,
                    run_id,
                    file_id,
                    kind,
                    model,
                    backend,
                    prompt,
                    hash,
                    t_in,
                    t_out,
                    status,
                    error,
                    created_at,
                )| {
                    Ok(ActionRecord {
                        id,
                        run_id,
                        file_id,
                        kind: parse_column("actions.action", kind)?,
                        model: model.unwrap_or_default(),
                        backend_used: backend.unwrap_or_default(),
                        prompt_text: prompt.unwrap_or_default(),
                        content_hash: hash.unwrap_or_default(),
                        tokens_in: t_in,
                        tokens_out: t_out,
                        status: parse_column("actions.status", status)?,
                        error_text: error.unwrap_or_default(),
                        created_at,
                    })
                },
            )
            .collect()
    }

    pub fn insert_summary(&self, action_id: i64, summary_text: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO summaries (action_id, summary) VALUES (?1, ?2)",
            params![action_id, summary_text],
        )?;
        Ok(())
    }

    pub fn summary_for(&self, action_id: i64) -> StoreResult<Option<String>> {
        let summary = self
            .conn
            .query_row(
                "SELECT summary FROM summaries WHERE action_id = ?1",
                params![action_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(summary)
    }

    pub fn insert_rewrite(
        &self,
        action_id: i64,
        rewritten_text: &str,
        diff_text: &str,
    ) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO rewrites (action_id, rewrite, diff) VALUES (?1, ?2, ?3)",
            params![action_id, rewritten_text, diff_text],
        )?;
        Ok(())
    }

    pub fn rewrite_for(&self, action_id: i64) -> StoreResult<Option<RewriteRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT action_id, rewrite, diff FROM rewrites WHERE action_id = ?1",
                params![action_id],
                |row| {
                    Ok(RewriteRecord {
                        action_id: row.get(0)?,
                        rewritten_text: row.get(1)?,
                        diff_text: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// Most recent action per file, from `vw_last_actions`
    pub fn last_actions(&self) -> StoreResult<Vec<LastAction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, path, action, status, created_at FROM vw_last_actions ORDER BY id DESC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(action_id, path, kind, status, created_at)| {
                Ok(LastAction {
                    action_id,
                    path,
                    kind: parse_column("vw_last_actions.action", kind)?,
                    status: parse_column("vw_last_actions.status", status)?,
                    created_at,
                })
            })
            .collect()
    }

    // --- operator queue ---------------------------------------------------

    /// Operator-side insert. An existing row for the same path is left
    /// untouched, so a done entry never returns to pending.
    pub fn enqueue(
        &self,
        path: &str,
        requested_by: Option<&str>,
        notes: Option<&str>,
    ) -> StoreResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO queued_files (path, requested_at, requested_by, notes, status)
             VALUES (?1, ?2, ?3, ?4, 'pending')",
            params![path, now_timestamp(), requested_by, notes],
        )?;
        Ok(inserted == 1)
    }

    /// Pending entries in request order
    pub fn pending_queue(&self) -> StoreResult<Vec<QueuedFile>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, path, requested_at, requested_by, notes, status
             FROM queued_files WHERE status = 'pending' AND path IS NOT NULL ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map([], Self::queued_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(Self::into_queued_file).collect()
    }

    pub fn queue_entry(&self, path: &str) -> StoreResult<Option<QueuedFile>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, path, requested_at, requested_by, notes, status
                 FROM queued_files WHERE path = ?1",
                params![path],
                Self::queued_row,
            )
            .optional()?;
        row.map(Self::into_queued_file).transpose()
    }

    /// pending -> done for the given row path; returns rows changed
    pub fn mark_queue_done(&self, path: &str) -> StoreResult<usize> {
        let changed = self.conn.execute(
            "UPDATE queued_files SET status = 'done' WHERE path = ?1 AND status = 'pending'",
            params![path],
        )?;
        Ok(changed)
    }

    fn queued_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<QueuedRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ))
    }

    fn into_queued_file(
        (id, path, requested_at, requested_by, notes, status): QueuedRow,
    ) -> StoreResult<QueuedFile> {
        let status = match status {
            Some(value) => parse_column("queued_files.status", value)?,
            None => QueueStatus::Pending,
        };
        Ok(QueuedFile {
            id,
            path,
            requested_at,
            requested_by,
            notes,
            status,
        })
    }

    // --- reporting --------------------------------------------------------

    pub fn counts(&self) -> StoreResult<StoreCounts> {
        let count =
            |sql: &str| -> StoreResult<i64> { Ok(self.conn.query_row(sql, [], |row| row.get(0))?) };
        Ok(StoreCounts {
            files: count("SELECT COUNT(*) FROM files")?,
            runs: count("SELECT COUNT(*) FROM runs")?,
            actions: count("SELECT COUNT(*) FROM actions")?,
            summaries: count("SELECT COUNT(*) FROM summaries")?,
            rewrites: count("SELECT COUNT(*) FROM rewrites")?,
            pending_queue: count("SELECT COUNT(*) FROM queued_files WHERE status = 'pending'")?,
        })
    }
}
