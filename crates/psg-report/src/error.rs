//! Error types for dataset writing.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    // === File System Errors ===
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    #[error("failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Existing error-count file is not valid JSON.
    #[error("invalid error counts in {path}: {source}")]
    ErrorCountsFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // === Signal Errors ===
    #[error("failed to load channel '{channel}' of {subject_id}: {source}")]
    SampleLoad {
        subject_id: String,
        channel: String,
        #[source]
        source: psg_edf::EdfError,
    },
}

/// Result type for dataset writing.
pub type Result<T> = std::result::Result<T, ReportError>;
