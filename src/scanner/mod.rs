//! Scanner Component
//!
//! Discovers candidate files under the scan root and loads the payload that
//! is sent to the backend for each of them.
//!
//! - **Directory pruning**: excluded directory segments and coarse
//!   ignore-file names cut whole subtrees before descent
//! - **File filters**: extension allow-list, exclusion globs, size cap for
//!   code-like files
//! - **Payloads**: log tails read backwards, everything else read up to the cap

pub mod error;
pub mod filters;
pub mod payload;
pub mod walker;

pub use error::{PayloadError, PayloadResult, ScanError};
pub use filters::{extension_of, ScanFilters};
pub use payload::{load_payload, tail_lines, FileKind};
pub use walker::gather_candidates;
