//! Error types for remote reconciliation.

use std::path::PathBuf;
use thiserror::Error;

use psg_core::CoreError;
use psg_report::ReportError;

#[derive(Debug, Error)]
pub enum SyncError {
    // === Remote Store Errors ===
    /// A remote store operation failed.
    #[error("remote {operation} failed for {path}: {source}")]
    Remote {
        operation: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    // === Local Errors ===
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Pipeline Errors ===
    #[error(transparent)]
    Convert(#[from] CoreError),

    #[error(transparent)]
    Write(#[from] ReportError),
}

/// Result type for remote reconciliation.
pub type Result<T> = std::result::Result<T, SyncError>;
