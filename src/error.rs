//! Error types for RecFile
//!
//! Provides a unified error type for all operations.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias using RecFileError
pub type Result<T> = std::result::Result<T, RecFileError>;

/// Unified error type for RecFile operations
#[derive(Debug, Error)]
pub enum RecFileError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Corrupt header in {}: {reason}", .path.display())]
    CorruptHeader { path: PathBuf, reason: String },

    #[error("Corrupt record chain in {}: {reason}", .path.display())]
    CorruptChain { path: PathBuf, reason: String },

    #[error("Field '{field}' not found in {}", .path.display())]
    FieldNotFound { path: PathBuf, field: String },

    // -------------------------------------------------------------------------
    // Bulk Load Errors
    // -------------------------------------------------------------------------
    #[error("Duplicate search key '{key}' in batch; nothing inserted")]
    DuplicateKeyBatch { key: String },

    #[error("Parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    // -------------------------------------------------------------------------
    // Join Errors
    // -------------------------------------------------------------------------
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Raised by external `SortedRowSource` implementations (a database
    /// cursor, a CSV reader) when they fail mid-stream
    #[error("Row source error: {0}")]
    Source(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RecFileError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        RecFileError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn corrupt_header(path: &Path, reason: impl Into<String>) -> Self {
        RecFileError::CorruptHeader {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt_chain(path: &Path, reason: impl Into<String>) -> Self {
        RecFileError::CorruptChain {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}
