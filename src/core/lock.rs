//! Run guard: a system-wide advisory lock admitting one run at a time
//!
//! The lock is an exclusive, non-blocking `flock`-style lock on a fixed path.
//! A busy lock is not an error: the caller skips the run.

use crate::core::error_handling::ContextualError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("Cannot create lock directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ContextualError for LockError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

/// Held for the whole run; the lock is released when dropped
#[derive(Debug)]
pub struct RunGuard {
    file: File,
    path: PathBuf,
}

impl RunGuard {
    /// Try to take the lock without waiting.
    ///
    /// `Ok(None)` means another holder has it and this run should be skipped.
    pub fn try_acquire(path: &Path) -> Result<Option<RunGuard>, LockError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| LockError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|source| LockError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                log::debug!("Acquired run lock {}", path.display());
                Ok(Some(RunGuard {
                    file,
                    path: path.to_path_buf(),
                }))
            }
            Err(err) => {
                if err.kind() != fs2::lock_contended_error().kind() {
                    log::debug!("Lock attempt on {} failed: {}", path.display(), err);
                }
                Ok(None)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            log::warn!("Failed to release run lock {}: {}", self.path.display(), err);
        } else {
            log::debug!("Released run lock {}", self.path.display());
        }
    }
}
