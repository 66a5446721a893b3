//! Command-line arguments

use crate::core::validation::validate_positive_int;
use clap::Parser;
use std::path::PathBuf;

// Single pass only: every flag adjusts one run. Values given here win over
// the configuration file and the environment.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "codewalker")]
#[command(
    about = "Summarize source and log files, or stage rewrites for review, with a text-generation backend"
)]
#[command(version)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Override the per-run file limit
    #[arg(short = 'n', long = "limit", value_name = "N", value_parser = validate_positive_int)]
    pub limit: Option<usize>,

    /// Override the rewrite percentage (clamped to 0-100)
    #[arg(
        short = 'p',
        long = "percent-rewrite",
        value_name = "N",
        allow_negative_numbers = true
    )]
    pub percent_rewrite: Option<i64>,

    /// Run one pass immediately (the default and only mode)
    #[arg(long = "once")]
    pub once: bool,

    /// Process only queued files and skip the directory scan
    #[arg(long = "queue-only")]
    pub queue_only: bool,

    /// Log level
    #[arg(
        short = 'l',
        long = "log-level",
        value_name = "LEVEL",
        value_parser = ["trace", "debug", "info", "warn", "error", "off"]
    )]
    pub log_level: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(
        short = 'f',
        long = "log-file",
        value_name = "FILE",
        help = "Log file path (use 'none' to disable file logging)"
    )]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(
        short = 'o',
        long = "log-format",
        value_name = "FORMAT",
        value_parser = ["text", "ext", "json"]
    )]
    pub log_format: Option<String>,
}

/// "none" and "-" switch file logging off
pub fn is_disabled_log_file(path: &std::path::Path) -> bool {
    path.as_os_str().eq_ignore_ascii_case("none") || path.as_os_str() == "-"
}
