//! Persistence store
//!
//! SQLite file holding runs, files, actions, summaries, rewrites and the
//! operator queue. Every write is its own statement and is committed
//! immediately; there is no transaction spanning several files.

pub mod error;
pub mod models;
pub mod schema;
mod sqlite;

pub use error::{StoreError, StoreResult};
pub use models::{
    ActionKind, ActionRecord, ActionStatus, FileRecord, LastAction, NewAction, QueueStatus,
    QueuedFile, RewriteRecord, RunRecord, StoreCounts,
};
pub use sqlite::Store;
