//! Validation utilities for configuration values and CLI arguments

use crate::core::error_handling::ContextualError;
use std::fmt;

/// A configuration or argument value the operator has to fix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

impl ContextualError for ValidationError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        Some(&self.message)
    }
}

/// Validate positive integer value
pub fn validate_positive_int(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("Value must be greater than 0".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{}' is not a valid positive integer", value)),
    }
}

/// Clamp a rewrite percentage into 0..=100
pub fn clamp_percent(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

/// Validate file extension format
pub fn validate_extension(ext: &str) -> Result<String, String> {
    let cleaned = ext.trim();
    let cleaned = cleaned.strip_prefix('.').unwrap_or(cleaned);

    if cleaned.is_empty() {
        return Err("Extension cannot be empty".to_string());
    }

    if cleaned.contains('/') || cleaned.contains('\\') {
        return Err("Extension cannot contain path separators".to_string());
    }

    Ok(cleaned.to_lowercase())
}

/// Validate glob pattern syntax
pub fn validate_glob_pattern(pattern: &str) -> Result<glob::Pattern, String> {
    glob::Pattern::new(pattern).map_err(|e| format!("Invalid glob pattern '{}': {}", pattern, e))
}
