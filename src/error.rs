//! Error types for the lead generation orchestrator.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the generation service to its callers.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("A lead generation session is already running: {0}")]
    Conflict(String),

    #[error("Invalid generation request: {0}")]
    InvalidRequest(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session {0} has already finished")]
    SessionTerminal(String),

    #[error("Session fault: {0}")]
    SessionFault(String),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure reported by a source adapter. Recovered locally by the orchestrator.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read fixture {path:?}: {source}")]
    Fixture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed candidate data: {0}")]
    Malformed(String),

    #[error("Source panicked: {0}")]
    Panicked(String),
}

/// Persistence failures for leads and the event journal.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Encoding(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Encoding(err.to_string())
    }
}

/// CSV export failures.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Export I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Nothing to export for session {0}")]
    Empty(String),
}

impl From<config::ConfigError> for GenerationError {
    fn from(err: config::ConfigError) -> Self {
        GenerationError::Config(err.to_string())
    }
}
