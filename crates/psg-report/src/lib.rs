//! Dataset writer for converted PSG series.
//!
//! Persists a [`psg_core::Dataset`] as a folder tree of JSON documents (one
//! folder per subject) with channel samples as raw little-endian `f32`.

mod dataset;
mod error;
mod json;

pub use dataset::{
    AASM_EVENTS_FILE, ATTRIBUTES_FILE, ERROR_COUNTS_FILE, HYPNOGRAM_FILE, METADATA_FILE,
    ORIGINAL_ANNOTATIONS_FILE, SAMPLE_ARRAYS_DIR, SAMPLE_DATA_FILE, WriteOptions, WriteSummary,
    read_error_counts, write_dataset, write_error_counts, write_series, write_subject,
};
pub use error::{ReportError, Result};
