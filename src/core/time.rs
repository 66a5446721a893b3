//! Timestamp helpers
//!
//! Every timestamp persisted by the store or written into a prompt uses the
//! same local-time ISO-8601 form with second precision.

use chrono::{DateTime, Local};
use std::time::SystemTime;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Current local time, e.g. `2025-03-01T14:02:11`
pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Format a filesystem time (mtime etc.) in the store's timestamp format
pub fn format_system_time(time: SystemTime) -> String {
    let local: DateTime<Local> = time.into();
    local.format(TIMESTAMP_FORMAT).to_string()
}
