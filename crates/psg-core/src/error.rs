//! Error types for series conversion.
//!
//! Per-recording failures are counted, not raised; these errors abort a
//! whole series or the ledger update.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // === File System Errors ===
    /// Series directory not found.
    #[error("series directory not found: {path}")]
    SeriesNotFound { path: PathBuf },

    /// File or directory I/O error.
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Atomic write failed (temp file couldn't be renamed).
    #[error("failed to replace {target_path} with {temp_path}: {source}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Ledger Errors ===
    /// The usage ledger is not valid JSON of the expected shape.
    #[error("invalid usage ledger {path}: {source}")]
    LedgerFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, CoreError>;
