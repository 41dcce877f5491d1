//! Series conversion for sleep-lab PSG recordings.
//!
//! Walks a series folder (one folder per patient), decodes each primary PSG
//! recording, loads and classifies its annotations and assembles
//! [`Subject`]s. A [`ConversionContext`] carries the error tally and the
//! [`UsageLedger`] of already converted subject ids across the batch.

mod assemble;
mod context;
mod error;
mod ledger;
mod subject;
mod subject_id;

// === Error Types ===
pub use error::{CoreError, Result};

// === Assembly ===
pub use assemble::{
    PRIMARY_PSG_MARKER, RecordingAnnotations, RecordingSignals, convert_dataset, list_edf_files,
    read_annotations, read_series, read_signals,
};
pub use context::ConversionContext;
pub use subject::{ArrayAttributes, Dataset, SampleArray, Series, Subject, channel_name};

// === Ledger ===
pub use ledger::{LEDGER_FILE_NAME, UsageEntry, UsageLedger};

// === Subject Ids ===
pub use subject_id::{RecordingName, recording_number, subject_id_from_path};
