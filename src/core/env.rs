//! Environment inputs
//!
//! `.env` files are loaded without overriding variables that are already set,
//! so an explicit environment always wins. The first file that defines a
//! variable wins over later candidates.

use std::path::{Path, PathBuf};

pub const ENV_BASE_URL: &str = "LLM_BASE_URL";
pub const ENV_API_KEY: &str = "LLM_API_KEY";

/// Candidate `.env` locations, most specific first
pub fn dotenv_candidates(config_file: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(".env")];
    if let Some(dir) = config_file.and_then(|p| p.parent()) {
        if !dir.as_os_str().is_empty() {
            candidates.push(dir.join(".env"));
        }
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".env"));
    }
    candidates
}

/// Load every existing candidate `.env`; returns the files actually loaded
pub fn load_dotenv(config_file: Option<&Path>) -> Vec<PathBuf> {
    dotenv_candidates(config_file)
        .into_iter()
        .filter(|p| p.is_file())
        .filter(|p| dotenvy::from_path(p).is_ok())
        .collect()
}

/// Read a non-empty environment variable
pub fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
