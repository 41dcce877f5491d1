//! Error types for annotation ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while detecting or parsing an annotation export.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Annotation file not found.
    #[error("annotation file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Layout Errors ===
    /// None of the known RemLogic header lines was found.
    #[error("no known header line in {path}")]
    UnrecognizedHeader { path: PathBuf },

    /// A fixed preamble line is missing.
    #[error("missing preamble line {line} in {path}")]
    MissingPreamble { path: PathBuf, line: usize },

    /// The export has no data rows to anchor the timeline on.
    #[error("no annotation rows in {path}")]
    EmptyTable { path: PathBuf },

    /// Required CSV column not found.
    #[error("required column '{column}' not found in {path}")]
    MissingColumn { column: &'static str, path: PathBuf },

    // === Value Errors ===
    /// Date or time text that does not match the expected format.
    #[error("invalid date/time '{value}' (expected {format}) in {path}")]
    InvalidDateTime {
        value: String,
        format: &'static str,
        path: PathBuf,
    },

    /// Invalid value in a typed field.
    #[error("invalid {field} value '{value}' in {path}")]
    InvalidValue {
        field: &'static str,
        value: String,
        path: PathBuf,
    },

    // === CSV Errors ===
    /// Failed to read a CSV record.
    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::InvalidDateTime {
            value: "25:00:00".to_string(),
            format: "%d/%m/%Y-%H:%M:%S",
            path: PathBuf::from("/data/PA1/rec.txt"),
        };
        assert_eq!(
            err.to_string(),
            "invalid date/time '25:00:00' (expected %d/%m/%Y-%H:%M:%S) in /data/PA1/rec.txt"
        );
    }
}
