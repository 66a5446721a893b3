//! Scanner Error Types

use std::path::PathBuf;

/// Discovery failure for a single path. The path is dropped and the walk
/// continues.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Cannot walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("Cannot stat {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read failure while loading the text sent to the backend
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("Cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl crate::core::error_handling::ContextualError for ScanError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

impl crate::core::error_handling::ContextualError for PayloadError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

pub type PayloadResult<T> = Result<T, PayloadError>;
