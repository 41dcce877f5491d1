//! Error types for EDF decoding.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EdfError {
    // === File System Errors ===
    #[error("failed to open EDF file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read EDF file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Header Errors ===
    #[error("not an EDF file (version field '{version}')")]
    UnsupportedVersion { version: String },

    #[error("invalid {field} field '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error("invalid start date/time '{date} {time}'")]
    InvalidStartDate { date: String, time: String },

    #[error("invalid number of signals: {0}")]
    InvalidSignalCount(usize),

    #[error("header size {actual} does not match {signals} signals (expected {expected})")]
    HeaderSize {
        actual: usize,
        expected: usize,
        signals: usize,
    },

    #[error("signal '{label}' has equal digital minimum and maximum")]
    DigitalRange { label: String },

    // === Annotation Errors ===
    #[error("malformed TAL in data record {record}: {reason}")]
    MalformedTal { record: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, EdfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EdfError::HeaderSize {
            actual: 512,
            expected: 768,
            signals: 2,
        };
        assert_eq!(
            err.to_string(),
            "header size 512 does not match 2 signals (expected 768)"
        );
    }
}
