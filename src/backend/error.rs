//! Backend Error Types

use crate::core::error_handling::ContextualError;

/// Longest slice of an error response body kept in messages
pub const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{backend} is not configured: {reason}")]
    NotConfigured { backend: String, reason: String },

    #[error("{backend} request failed: {source}")]
    Transport {
        backend: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{backend} {status}: {body}")]
    Status {
        backend: String,
        status: u16,
        body: String,
    },

    #[error("{backend} returned an unreadable response: {reason}")]
    InvalidResponse { backend: String, reason: String },

    #[error("{backend}: empty content")]
    EmptyContent { backend: String },

    /// Every adapter in the sequence failed; `cause` is the last failure
    #[error("All backends failed (tried: {}): {}", .tried.join(", "), .cause)]
    AllFailed {
        tried: Vec<String>,
        cause: Box<BackendError>,
    },

    #[error("Cannot build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ContextualError for BackendError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, BackendError::NotConfigured { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            BackendError::NotConfigured { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// First `ERROR_BODY_LIMIT` characters of a response body
pub fn truncate_body(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}
