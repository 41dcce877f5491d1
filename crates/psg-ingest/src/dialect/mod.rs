//! Annotation export dialects.
//!
//! Each dialect turns its on-disk export into an [`EventTable`] whose
//! `start_sec` counts from the first annotation; re-anchoring to the EDF
//! recording start happens later, in `psg-transform`.

mod brainrt;
mod deltamed;
mod remlogic;

use std::path::Path;

use tracing::warn;

use psg_edf::EdfDecoder;
use psg_model::{EventTable, RecordingDevice};

use crate::detect::detect_dialect;
use crate::error::{IngestError, Result};

pub use brainrt::{BrainRt, CSV_DATETIME_FORMAT, edf_events};
pub use deltamed::{Deltamed, RTF_DATETIME_FORMAT, STAGE_BLOCK_SEPARATOR, STAGE_LABELS};
pub use remlogic::{HeaderLayout, REMLOGIC_STAGE_LABELS, RemLogic};

/// Text datetime format shared by the Deltamed stage log and RemLogic.
pub const TEXT_DATETIME_FORMAT: &str = "%d/%m/%Y-%H:%M:%S";

/// One annotation export format.
pub trait AnnotationDialect {
    /// Device name reported for recordings annotated in this dialect.
    fn device(&self) -> RecordingDevice;

    /// Parses the export of recording `base` in `dir/patient`.
    fn parse(&self, dir: &Path, patient: &str, base: &str) -> Result<EventTable>;
}

/// Outcome of annotation loading for one recording.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedAnnotations {
    pub device: RecordingDevice,
    /// `None` when no usable annotation export exists.
    pub events: Option<EventTable>,
}

impl LoadedAnnotations {
    fn unknown() -> Self {
        Self {
            device: RecordingDevice::Unknown,
            events: None,
        }
    }
}

/// Detects the dialect of recording `base` and parses its export.
///
/// A RemLogic file without a known header is reported as
/// [`RecordingDevice::Unknown`] without events. Every other parse failure is
/// returned to the caller.
pub fn load_annotation(
    dir: &Path,
    patient: &str,
    base: &str,
    decoder: &dyn EdfDecoder,
) -> Result<LoadedAnnotations> {
    let dialect: Box<dyn AnnotationDialect + '_> = match detect_dialect(dir, patient, base)? {
        RecordingDevice::Deltamed => Box::new(Deltamed),
        RecordingDevice::RemLogic => Box::new(RemLogic),
        RecordingDevice::BrainRt => Box::new(BrainRt::new(decoder)),
        RecordingDevice::Unknown => return Ok(LoadedAnnotations::unknown()),
    };
    match dialect.parse(dir, patient, base) {
        Ok(events) => Ok(LoadedAnnotations {
            device: dialect.device(),
            events: Some(events),
        }),
        Err(IngestError::UnrecognizedHeader { path }) => {
            warn!(patient, file = %path.display(), "unrecognized annotation header");
            Ok(LoadedAnnotations::unknown())
        }
        Err(err) => Err(err),
    }
}
