//! Action Pipeline
//!
//! Per-file orchestration: payload, change tracking, action choice, prompt,
//! backend call, post-processing and persistence. Files are handled one at a
//! time in candidate order; original files are only ever read.

pub mod action;
pub mod bracket;
pub mod error;
pub mod postprocess;
pub mod prompts;
pub mod runner;

pub use action::choose_action;
pub use bracket::RunBracket;
pub use error::{FileError, WalkerError};
pub use prompts::PromptPool;
pub use runner::{run, RunOutcome, RunReport};
