//! Error types for FlatKV
//!
//! Provides a unified error type for all operations. Only opening and
//! flushing a store can fail with an error; key and domain operations
//! report misses through their return values.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using FlatKvError
pub type Result<T> = std::result::Result<T, FlatKvError>;

/// Unified error type for FlatKV operations
#[derive(Debug, Error)]
pub enum FlatKvError {
    // -------------------------------------------------------------------------
    // Open Errors
    // -------------------------------------------------------------------------
    #[error("Storage file cannot be written to: {path}: {reason}")]
    FileAccess { path: PathBuf, reason: String },

    #[error("Corrupt data: {0}")]
    CorruptData(String),

    #[error("Data from file is not valid, fails checksum (stored {stored}, computed {computed})")]
    Integrity { stored: String, computed: String },

    // -------------------------------------------------------------------------
    // Flush Errors
    // -------------------------------------------------------------------------
    #[error("Unable to write back to {path}, recent changes may be lost: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FlatKvError {
    /// Build a `FileAccess` error for `path`
    pub(crate) fn file_access(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        FlatKvError::FileAccess {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
