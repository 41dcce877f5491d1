//! Annotation ingestion for sleep-lab PSG recordings.
//!
//! Three export dialects annotate the recordings:
//!
//! - **Deltamed**: a Latin-1 TXT stage log plus an RTF event log
//! - **RemLogic**: one Latin-1 tab separated TXT export
//! - **BrainRT**: a UTF-16 CSV event report, with stages embedded in the EDF+
//!
//! [`detect_dialect`] picks the dialect from the files next to the EDF and
//! [`load_annotation`] parses it into an [`psg_model::EventTable`].

mod detect;
mod dialect;
mod error;
mod rtf;
mod text;

// === Error Types ===
pub use error::{IngestError, Result};

// === Detection ===
pub use detect::{REMLOGIC_MARKER, annotation_path, detect_dialect};

// === Dialects ===
pub use dialect::{
    AnnotationDialect, BrainRt, CSV_DATETIME_FORMAT, Deltamed, HeaderLayout, LoadedAnnotations,
    REMLOGIC_STAGE_LABELS, RTF_DATETIME_FORMAT, RemLogic, STAGE_BLOCK_SEPARATOR, STAGE_LABELS,
    TEXT_DATETIME_FORMAT, edf_events, load_annotation,
};

// === Text Decoding ===
pub use rtf::{replace_control_sequences, rtf_to_text};
pub use text::{decode_latin1, decode_utf16, read_latin1, read_utf16};
