//! Core services and infrastructure

pub mod cleanup;
pub mod config;
pub mod env;
pub mod error_handling;
pub mod host;
pub mod lock;
pub mod logging;
pub mod time;
pub mod validation;
pub mod version;
