//! CodeWalker: walks a source tree, asks a text-generation backend to summarize
//! files or propose rewrites, and records every decision in SQLite. Original
//! files are only ever read.

pub mod app;
pub mod backend;
pub mod core;
pub mod diff;
pub mod pipeline;
pub mod queue;
pub mod scanner;
pub mod store;
pub mod tracker;
