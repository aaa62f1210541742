//! # Search Sync
//!
//! Command line entry point and wiring for the search sync pipeline.
//!
//! This crate loads settings, sets up logging, resolves the entity types to
//! resync and reads their records from NDJSON files.

pub mod cli;
pub mod config;
pub mod logging;
pub mod store;

pub use cli::{run, Cli, RunReport};
pub use config::{Dependencies, SettingsLoader};

use thiserror::Error;

/// Errors that can occur while setting up a sync.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
