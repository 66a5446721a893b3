//! Pipeline errors
//!
//! A `FileError` other than `Store` is logged and the loop moves on to the
//! next candidate. `WalkerError` aborts the run.

use crate::core::error_handling::ContextualError;
use crate::core::lock::LockError;
use crate::scanner::PayloadError;
use crate::store::StoreError;
use crate::tracker::TrackError;

#[derive(Debug, thiserror::Error)]
pub enum WalkerError {
    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("Store failure: {0}")]
    Store(#[from] StoreError),

    #[error("Cannot serialize config snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl ContextualError for WalkerError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

/// Failure while handling one candidate
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Track(TrackError),

    /// Aborts the run
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<TrackError> for FileError {
    fn from(error: TrackError) -> Self {
        match error {
            TrackError::Store(e) => FileError::Store(e),
            other => FileError::Track(other),
        }
    }
}
