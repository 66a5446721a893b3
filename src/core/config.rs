//! Run configuration
//!
//! One immutable structure holding every recognized setting with an explicit
//! default. Loading and merging (TOML document, environment, CLI) lives in
//! `app::cli::config`; everything downstream only reads a `&Config`.

use crate::core::validation::{validate_extension, validate_glob_pattern, ValidationError};
use crate::core::version::APP_NAME;
use crate::store::models::ActionKind;
use serde::Serialize;
use std::path::PathBuf;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

pub const DEFAULT_REWRITE_PROMPT: &str = "Make this code more readable and modular.";
pub const DEFAULT_MODEL: &str = "gemma3:4b";

/// Which backend(s) the router may call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString, EnumIter, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum BackendSelection {
    /// Try every adapter in order: lmstudio, ollama, openai_compat
    #[serde(rename = "auto")]
    #[strum(to_string = "auto")]
    Auto,
    #[serde(rename = "lmstudio")]
    #[strum(to_string = "lmstudio")]
    LmStudio,
    #[serde(rename = "ollama")]
    #[strum(to_string = "ollama")]
    Ollama,
    #[serde(rename = "openai_compat")]
    #[strum(to_string = "openai_compat", serialize = "openai")]
    OpenAiCompat,
    #[serde(rename = "custom")]
    #[strum(to_string = "custom")]
    Custom,
}

/// Where candidates come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum RunMode {
    /// Pending queue entries first, then the directory scan
    #[serde(rename = "cron")]
    #[strum(to_string = "cron", serialize = "scan", serialize = "normal")]
    Cron,
    /// Pending queue entries only; the scanner is skipped
    #[serde(rename = "queue")]
    #[strum(
        to_string = "queue",
        serialize = "que",
        serialize = "queued",
        serialize = "queue-only"
    )]
    Queue,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub root: PathBuf,
    pub file_types: Vec<String>,
    pub code_extensions: Vec<String>,
    pub log_extensions: Vec<String>,
    pub actions: Vec<ActionKind>,
    pub rewrite_prompt: String,
    pub prompt_file: Option<PathBuf>,
    pub limit_per_run: usize,
    pub percent_rewrite: u8,
    pub backend: BackendSelection,
    pub base_url: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub lmstudio_url: String,
    pub ollama_url: String,
    pub custom_endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub lmstudio_timeout_secs: u64,
    pub ollama_timeout_secs: u64,
    pub remote_timeout_secs: u64,
    pub max_filesize_kb: u64,
    pub log_tail_lines: usize,
    pub exclude_dirs: Vec<String>,
    pub exclude_files: Vec<String>,
    pub respect_gitignore: bool,
    pub ignore_file: String,
    pub lockfile: PathBuf,
    pub db_path: PathBuf,
    pub mode: RunMode,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub log_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            file_types: strings(&["php", "py", "sh", "log"]),
            code_extensions: strings(&["php", "py", "sh"]),
            log_extensions: strings(&["log"]),
            actions: vec![ActionKind::Summarize, ActionKind::Rewrite],
            rewrite_prompt: DEFAULT_REWRITE_PROMPT.to_string(),
            prompt_file: None,
            limit_per_run: 5,
            percent_rewrite: 50,
            backend: BackendSelection::Auto,
            base_url: None,
            api_key: None,
            lmstudio_url: "http://127.0.0.1:1234".to_string(),
            ollama_url: "http://127.0.0.1:11434".to_string(),
            custom_endpoint: "/v1/chat/completions".to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            lmstudio_timeout_secs: 900,
            ollama_timeout_secs: 180,
            remote_timeout_secs: 180,
            max_filesize_kb: 512,
            log_tail_lines: 1200,
            exclude_dirs: strings(&[
                ".git",
                "vendor",
                "node_modules",
                "storage",
                "cache",
                "tmp",
                "uploads",
            ]),
            exclude_files: strings(&["codewalker.toml"]),
            respect_gitignore: true,
            ignore_file: ".gitignore".to_string(),
            lockfile: std::env::temp_dir().join("codewalker.lock"),
            db_path: dirs::data_dir()
                .map(|d| d.join(APP_NAME).join("codewalker.db"))
                .unwrap_or_else(|| PathBuf::from("codewalker.db")),
            mode: RunMode::Cron,
            log_level: "info".to_string(),
            log_file: None,
            log_format: "text".to_string(),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Config {
    /// Size cap for code-like files in bytes
    pub fn max_file_bytes(&self) -> u64 {
        self.max_filesize_kb.saturating_mul(1024)
    }

    pub fn is_allowed_ext(&self, ext: &str) -> bool {
        self.file_types.iter().any(|e| e == ext)
    }

    pub fn is_code_ext(&self, ext: &str) -> bool {
        self.code_extensions.iter().any(|e| e == ext)
    }

    pub fn is_log_ext(&self, ext: &str) -> bool {
        self.log_extensions.iter().any(|e| e == ext)
    }

    /// True when rewrites may be chosen at all
    pub fn rewrite_enabled(&self) -> bool {
        self.actions.contains(&ActionKind::Rewrite)
    }

    /// Opaque audit copy stored on the run row. The API key is never included.
    pub fn snapshot_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Normalize extension lists and check cross-field constraints.
    /// Called once after every source has been merged.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.file_types = normalize_extensions("file-types", &self.file_types)?;
        self.code_extensions = normalize_extensions("code-extensions", &self.code_extensions)?;
        self.log_extensions = normalize_extensions("log-extensions", &self.log_extensions)?;

        if self.limit_per_run == 0 {
            return Err(ValidationError::new("limit-per-run must be at least 1"));
        }
        if self.percent_rewrite > 100 {
            return Err(ValidationError::new("percent-rewrite must be between 0 and 100"));
        }
        if !self.actions.contains(&ActionKind::Summarize) {
            return Err(ValidationError::new(
                "actions must include 'summarize' (non-code files are always summarized)",
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ValidationError::new("model cannot be empty"));
        }
        for pattern in &self.exclude_files {
            validate_glob_pattern(pattern.trim()).map_err(ValidationError::new)?;
        }
        self.exclude_dirs = self
            .exclude_dirs
            .iter()
            .map(|d| d.trim().trim_matches('/').to_string())
            .filter(|d| !d.is_empty())
            .fold(Vec::new(), |mut acc, d| {
                if !acc.contains(&d) {
                    acc.push(d);
                }
                acc
            });
        Ok(self)
    }
}

fn normalize_extensions(key: &str, values: &[String]) -> Result<Vec<String>, ValidationError> {
    let mut out = Vec::new();
    for value in values {
        let ext = validate_extension(value)
            .map_err(|e| ValidationError::new(format!("{}: {}", key, e)))?;
        if !out.contains(&ext) {
            out.push(ext);
        }
    }
    if out.is_empty() {
        return Err(ValidationError::new(format!("{} cannot be empty", key)));
    }
    Ok(out)
}
