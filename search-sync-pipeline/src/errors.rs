//! Sync error types.
//!
//! This module defines the errors raised while projecting records and pushing
//! documents to the search engine.

use std::path::PathBuf;

use search_sync_repository::SearchError;
use thiserror::Error;

/// Errors that can occur in the sync pipeline.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The index name, connection or mapping could not be resolved.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A projected document is unusable, e.g. the id field is missing.
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// The search engine request failed.
    #[error("Transport error: {0}")]
    Transport(#[from] SearchError),

    /// A bulk resource file does not exist.
    #[error("Resource not found: {}", .0.display())]
    ResourceNotFound(PathBuf),

    /// The record source failed to count or page records.
    #[error("Source error: {0}")]
    Source(String),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize a document.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SyncError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a source error.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Error raised when a document lacks its id field.
    pub fn missing_id(field: &str) -> Self {
        Self::Mapping(format!("Data must contain the \"{}\" property", field))
    }
}
