//! Generic error handling utilities
//!
//! Startup and run-level failures are reported through one function so that
//! operator-fixable problems (bad config values, unusable paths) show their
//! own message while system failures show the operation that broke, with the
//! detail pushed down to debug level.

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// When `is_user_actionable()` returns `true`, `user_message()` should return
/// `Some(message)`; otherwise it should return `None`.
pub trait ContextualError: std::error::Error {
    /// True if the message tells the operator exactly what to fix
    /// (config validation, a lock path that cannot be created, ...)
    fn is_user_actionable(&self) -> bool;

    /// The operator-facing message for user-actionable errors
    fn user_message(&self) -> Option<&str>;
}

/// Log errors with appropriate detail level based on error specificity
///
/// # Examples
/// ```rust,no_run
/// # use codewalker::core::error_handling::log_error_with_context;
/// # use codewalker::core::validation::ValidationError;
/// let err = ValidationError::new("limit-per-run must be at least 1");
/// log_error_with_context(&err, "Configuration loading");
/// // Logs: "FATAL: limit-per-run must be at least 1"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => log::error!("FATAL: {}", user_msg),
        _ => log::error!("FATAL: {}: {}", operation_context, error),
    }
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
