//! Reconciliation of a remote PSG archive with converted subject folders.
//!
//! The archive is organised as `<year>/<patient>/` holding raw recording
//! files and, once converted, one `slf_<subject id>` folder per recording.
//! [`YearSync`] finds the recordings of a year that have no converted folder,
//! converts them locally and uploads the results.

mod batch;
mod error;
mod inventory;
mod store;

// === Error Types ===
pub use error::{Result, SyncError};

// === Remote Store ===
pub use store::{LocalDirStore, RemoteStore, join_remote};

// === Inventory ===
pub use inventory::{
    PatientStatus, RecordingKey, SLF_FOLDER_PREFIX, check_patient_recordings,
    extract_recording_values,
};

// === Year Batch ===
pub use batch::{RAW_EXTENSIONS, STAGING_DATASET, YearReport, YearSync, lowercase_extensions};
