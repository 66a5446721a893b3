//! Change tracking: full-content hash per visit, upserted into `files`.
//!
//! The hash is recorded only. It does not gate reprocessing of unchanged
//! files; every candidate is processed on every run.

use crate::core::error_handling::ContextualError;
use crate::store::{Store, StoreError};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("Cannot hash {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ContextualError for TrackError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

/// Result of visiting one file
#[derive(Debug, Clone)]
pub struct TrackedFile {
    pub file_id: i64,
    pub content_hash: String,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

/// Lower-case hex SHA-256 over the whole file, streamed
pub fn content_hash(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Hash the file and insert or refresh its `files` row
pub fn track(store: &Store, path: &Path, ext: &str) -> Result<TrackedFile, TrackError> {
    let read_err = |source| TrackError::Read {
        path: path.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(path).map_err(read_err)?;
    let hash = content_hash(path).map_err(read_err)?;
    let file_id = store.upsert_file(&path.to_string_lossy(), ext, &hash)?;

    Ok(TrackedFile {
        file_id,
        content_hash: hash,
        size: metadata.len(),
        modified: metadata.modified().ok(),
    })
}
