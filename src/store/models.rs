//! Row types and the closed vocabularies stored in text columns

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

/// What was asked of the backend for one file
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    Summarize,
    Rewrite,
}

/// Terminal status of an action; fixed at insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionStatus {
    Ok,
    Error,
}

/// Queue entries only ever move pending -> done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: i64,
    pub path: String,
    pub extension: String,
    pub first_seen: String,
    pub last_seen: String,
    pub last_content_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub host: String,
    pub pid: u32,
    pub config_json: String,
}

/// Everything needed to insert one action row
#[derive(Debug, Clone)]
pub struct NewAction<'a> {
    pub run_id: i64,
    pub file_id: i64,
    pub kind: ActionKind,
    pub model: &'a str,
    pub backend_used: &'a str,
    pub prompt_text: &'a str,
    pub content_hash: &'a str,
    pub tokens_in: Option<i64>,
    pub tokens_out: Option<i64>,
    pub status: ActionStatus,
    pub error_text: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionRecord {
    pub id: i64,
    pub run_id: i64,
    pub file_id: i64,
    pub kind: ActionKind,
    pub model: String,
    pub backend_used: String,
    pub prompt_text: String,
    pub content_hash: String,
    pub tokens_in: Option<i64>,
    pub tokens_out: Option<i64>,
    pub status: ActionStatus,
    pub error_text: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRecord {
    pub action_id: i64,
    pub rewritten_text: String,
    pub diff_text: String,
}

/// One row of `vw_last_actions`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastAction {
    pub action_id: i64,
    pub path: String,
    pub kind: ActionKind,
    pub status: ActionStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedFile {
    pub id: i64,
    pub path: String,
    pub requested_at: Option<String>,
    pub requested_by: Option<String>,
    pub notes: Option<String>,
    pub status: QueueStatus,
}

/// Row counts, logged at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub files: i64,
    pub runs: i64,
    pub actions: i64,
    pub summaries: i64,
    pub rewrites: i64,
    pub pending_queue: i64,
}
