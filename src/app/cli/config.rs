//! TOML configuration file parsing and loading
//!
//! Builds the run `Config` from, in increasing precedence: built-in
//! defaults, environment fallbacks, the TOML document and CLI arguments.
//! The result is validated once and never modified afterwards.

use super::args::{is_disabled_log_file, Args};
use crate::core::config::{BackendSelection, Config, RunMode};
use crate::core::env::{load_dotenv, non_empty_var, ENV_API_KEY, ENV_BASE_URL};
use crate::core::validation::{clamp_percent, ValidationError};
use crate::core::version::APP_NAME;
use crate::store::ActionKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use strum::IntoEnumIterator;

/// Every key the configuration document may contain
pub const KNOWN_KEYS: &[&str] = &[
    "root",
    "scan-path",
    "file-types",
    "code-extensions",
    "log-extensions",
    "actions",
    "rewrite-prompt",
    "prompt-file",
    "limit-per-run",
    "percent-rewrite",
    "backend",
    "base-url",
    "api-key",
    "lmstudio-url",
    "ollama-url",
    "custom-endpoint",
    "model",
    "temperature",
    "lmstudio-timeout-secs",
    "ollama-timeout-secs",
    "remote-timeout-secs",
    "max-filesize-kb",
    "log-tail-lines",
    "exclude-dirs",
    "exclude-files",
    "respect-gitignore",
    "ignore-file",
    "lockfile",
    "db-path",
    "mode",
    "log-level",
    "log-file",
    "log-format",
];

/// A validated configuration plus what went into it
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// Configuration document that was read, if any
    pub source: Option<PathBuf>,
    /// Keys present in the document but not recognized (ignored)
    pub unknown_keys: Vec<String>,
    /// `.env` files that were loaded
    pub dotenv_files: Vec<PathBuf>,
}

/// `<config dir>/CodeWalker/codewalker.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME).join("codewalker.toml"))
}

/// A named file must exist; otherwise the default location is used when present
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>, ValidationError> {
    match explicit {
        Some(path) if path.is_file() => Ok(Some(path.to_path_buf())),
        Some(path) => Err(ValidationError::new(format!(
            "The specified configuration file does not exist: {}",
            path.display()
        ))),
        None => Ok(default_config_path().filter(|p| p.is_file())),
    }
}

pub fn read_table(path: &Path) -> Result<toml::Table, ValidationError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        ValidationError::new(format!(
            "Error reading configuration file {}: {}",
            path.display(),
            e
        ))
    })?;
    toml::from_str::<toml::Table>(&contents).map_err(|e| {
        ValidationError::new(format!(
            "Error parsing configuration file {}: {}",
            path.display(),
            e
        ))
    })
}

/// Resolve, merge and validate the configuration for this invocation
pub fn load(args: &Args) -> Result<LoadedConfig, ValidationError> {
    let source = resolve_config_path(args.config_file.as_deref())?;
    let dotenv_files = load_dotenv(source.as_deref());

    let mut config = Config::default();
    let mut unknown_keys = Vec::new();
    if let Some(path) = &source {
        let table = read_table(path)?;
        unknown_keys = apply_toml_values(&mut config, &table).map_err(|e| {
            ValidationError::new(format!(
                "Error in configuration file {}: {}",
                path.display(),
                e
            ))
        })?;
    }

    apply_env_fallbacks(&mut config);
    apply_args(&mut config, args);

    Ok(LoadedConfig {
        config: config.validate()?,
        source,
        unknown_keys,
        dotenv_files,
    })
}

/// Copy recognized keys from the document into `config`.
///
/// Returns the keys that were not recognized. A recognized key holding a
/// value of the wrong type is an error.
pub fn apply_toml_values(
    config: &mut Config,
    table: &toml::Table,
) -> Result<Vec<String>, ValidationError> {
    let unknown: Vec<String> = table
        .keys()
        .filter(|k| !KNOWN_KEYS.contains(&k.as_str()))
        .cloned()
        .collect();

    if let Some(root) = get_str(table, "root")?.or(get_str(table, "scan-path")?) {
        config.root = PathBuf::from(root);
    }
    if let Some(types) = get_list(table, "file-types")? {
        config.file_types = types;
    }
    if let Some(exts) = get_list(table, "code-extensions")? {
        config.code_extensions = exts;
    }
    if let Some(exts) = get_list(table, "log-extensions")? {
        config.log_extensions = exts;
    }
    if let Some(actions) = get_list(table, "actions")? {
        config.actions = actions
            .iter()
            .map(|a| {
                ActionKind::from_str(&a.trim().to_lowercase())
                    .map_err(|_| ValidationError::new(format!("actions: unknown action '{}'", a)))
            })
            .collect::<Result<_, _>>()?;
    }
    if let Some(prompt) = get_str(table, "rewrite-prompt")? {
        config.rewrite_prompt = prompt;
    }
    if let Some(file) = get_str(table, "prompt-file")? {
        config.prompt_file = non_empty(file).map(PathBuf::from);
    }
    if let Some(limit) = get_int(table, "limit-per-run")? {
        config.limit_per_run = usize::try_from(limit).map_err(|_| {
            ValidationError::new("limit-per-run must be at least 1")
        })?;
    }
    if let Some(percent) = get_int(table, "percent-rewrite")? {
        config.percent_rewrite = clamp_percent(percent);
    }
    if let Some(backend) = get_str(table, "backend")? {
        config.backend = BackendSelection::from_str(backend.trim()).map_err(|_| {
            ValidationError::new(format!(
                "backend: unknown backend '{}' (expected one of: {})",
                backend,
                choices::<BackendSelection>()
            ))
        })?;
    }
    if let Some(url) = get_str(table, "base-url")? {
        config.base_url = non_empty(url);
    }
    if let Some(key) = get_str(table, "api-key")? {
        config.api_key = non_empty(key);
    }
    if let Some(url) = get_str(table, "lmstudio-url")? {
        config.lmstudio_url = url;
    }
    if let Some(url) = get_str(table, "ollama-url")? {
        config.ollama_url = url;
    }
    if let Some(endpoint) = get_str(table, "custom-endpoint")? {
        config.custom_endpoint = endpoint;
    }
    if let Some(model) = get_str(table, "model")? {
        config.model = model;
    }
    if let Some(temperature) = get_float(table, "temperature")? {
        config.temperature = temperature as f32;
    }
    if let Some(secs) = get_uint(table, "lmstudio-timeout-secs")? {
        config.lmstudio_timeout_secs = secs;
    }
    if let Some(secs) = get_uint(table, "ollama-timeout-secs")? {
        config.ollama_timeout_secs = secs;
    }
    if let Some(secs) = get_uint(table, "remote-timeout-secs")? {
        config.remote_timeout_secs = secs;
    }
    if let Some(kb) = get_uint(table, "max-filesize-kb")? {
        config.max_filesize_kb = kb;
    }
    if let Some(lines) = get_uint(table, "log-tail-lines")? {
        config.log_tail_lines = lines as usize;
    }
    if let Some(dirs) = get_list(table, "exclude-dirs")? {
        config.exclude_dirs = dirs;
    }
    if let Some(files) = get_list(table, "exclude-files")? {
        config.exclude_files = files;
    }
    if let Some(respect) = get_bool(table, "respect-gitignore")? {
        config.respect_gitignore = respect;
    }
    if let Some(name) = get_str(table, "ignore-file")? {
        config.ignore_file = name;
    }
    if let Some(path) = get_str(table, "lockfile")? {
        config.lockfile = PathBuf::from(path);
    }
    if let Some(path) = get_str(table, "db-path")? {
        config.db_path = PathBuf::from(path);
    }
    if let Some(mode) = get_str(table, "mode")? {
        config.mode = RunMode::from_str(mode.trim()).map_err(|_| {
            ValidationError::new(format!(
                "mode: unknown mode '{}' (expected one of: {})",
                mode,
                choices::<RunMode>()
            ))
        })?;
    }
    if let Some(level) = get_str(table, "log-level")? {
        config.log_level = level;
    }
    if let Some(file) = get_str(table, "log-file")? {
        let path = PathBuf::from(file.trim());
        config.log_file = if file.trim().is_empty() || is_disabled_log_file(&path) {
            None // Magic values "none" and "-" disable file logging
        } else {
            Some(path)
        };
    }
    if let Some(format) = get_str(table, "log-format")? {
        config.log_format = format;
    }

    Ok(unknown)
}

/// `LLM_BASE_URL` / `LLM_API_KEY` fill values the document left unset
pub fn apply_env_fallbacks(config: &mut Config) {
    if config.base_url.is_none() {
        config.base_url = non_empty_var(ENV_BASE_URL);
    }
    if config.api_key.is_none() {
        config.api_key = non_empty_var(ENV_API_KEY);
    }
}

pub fn apply_args(config: &mut Config, args: &Args) {
    if let Some(limit) = args.limit {
        config.limit_per_run = limit;
    }
    if let Some(percent) = args.percent_rewrite {
        config.percent_rewrite = clamp_percent(percent);
    }
    if args.queue_only {
        config.mode = RunMode::Queue;
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    if let Some(file) = &args.log_file {
        config.log_file = if is_disabled_log_file(file) {
            None
        } else {
            Some(file.clone())
        };
    }
    if let Some(format) = &args.log_format {
        config.log_format = format.clone();
    }
}

fn choices<E: IntoEnumIterator + std::fmt::Display>() -> String {
    E::iter().map(|e| e.to_string()).collect::<Vec<_>>().join(", ")
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn type_error(key: &str, expected: &str) -> ValidationError {
    ValidationError::new(format!("{} must be {}", key, expected))
}

fn get_str(table: &toml::Table, key: &str) -> Result<Option<String>, ValidationError> {
    match table.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| type_error(key, "a string")),
    }
}

fn get_int(table: &toml::Table, key: &str) -> Result<Option<i64>, ValidationError> {
    match table.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_integer()
            .map(Some)
            .ok_or_else(|| type_error(key, "an integer")),
    }
}

fn get_uint(table: &toml::Table, key: &str) -> Result<Option<u64>, ValidationError> {
    match get_int(table, key)? {
        None => Ok(None),
        Some(n) => u64::try_from(n)
            .map(Some)
            .map_err(|_| type_error(key, "a non-negative integer")),
    }
}

fn get_float(table: &toml::Table, key: &str) -> Result<Option<f64>, ValidationError> {
    match table.get(key) {
        None => Ok(None),
        Some(toml::Value::Float(f)) => Ok(Some(*f)),
        Some(toml::Value::Integer(i)) => Ok(Some(*i as f64)),
        Some(_) => Err(type_error(key, "a number")),
    }
}

fn get_bool(table: &toml::Table, key: &str) -> Result<Option<bool>, ValidationError> {
    match table.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_bool()
            .map(Some)
            .ok_or_else(|| type_error(key, "true or false")),
    }
}

/// A single string (comma-separated) or an array of strings
fn get_list(table: &toml::Table, key: &str) -> Result<Option<Vec<String>>, ValidationError> {
    let raw: Vec<String> = match table.get(key) {
        None => return Ok(None),
        Some(toml::Value::String(s)) => vec![s.clone()],
        Some(toml::Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| type_error(key, "a list of strings"))
            })
            .collect::<Result<_, _>>()?,
        Some(_) => return Err(type_error(key, "a string or a list of strings")),
    };

    let mut values: Vec<String> = Vec::new();
    for item in raw.iter().flat_map(|s| s.split(',')) {
        let item = item.trim();
        if !item.is_empty() && !values.iter().any(|v| v == item) {
            values.push(item.to_string());
        }
    }
    Ok(Some(values))
}
