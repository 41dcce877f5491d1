//! Annotation export detection.

use std::path::{Path, PathBuf};

use tracing::debug;

use psg_model::RecordingDevice;

use crate::error::Result;
use crate::text::read_bytes;

/// Marker found in every RemLogic text export.
pub const REMLOGIC_MARKER: &[u8] = b"RemLogic";

/// Path of the `<base>.<extension>` annotation file of a patient folder.
///
/// Export names often carry stray whitespace, so the base name is trimmed.
pub fn annotation_path(dir: &Path, patient: &str, base: &str, extension: &str) -> PathBuf {
    dir.join(patient).join(format!("{}.{extension}", base.trim()))
}

/// Determines which export dialect annotates the recording `base`.
///
/// Precedence: an `.rtf` file means Deltamed; otherwise a `.txt` file means
/// RemLogic when it carries the RemLogic marker and Unknown when it does not;
/// otherwise a `.csv` file means BrainRT.
pub fn detect_dialect(dir: &Path, patient: &str, base: &str) -> Result<RecordingDevice> {
    let device = if annotation_path(dir, patient, base, "rtf").is_file() {
        RecordingDevice::Deltamed
    } else {
        let txt_path = annotation_path(dir, patient, base, "txt");
        if txt_path.is_file() {
            let bytes = read_bytes(&txt_path)?;
            if contains_marker(&bytes) {
                RecordingDevice::RemLogic
            } else {
                RecordingDevice::Unknown
            }
        } else if annotation_path(dir, patient, base, "csv").is_file() {
            RecordingDevice::BrainRt
        } else {
            RecordingDevice::Unknown
        }
    };
    debug!(patient, base = base.trim(), device = %device, "detected annotation dialect");
    Ok(device)
}

fn contains_marker(bytes: &[u8]) -> bool {
    bytes
        .windows(REMLOGIC_MARKER.len())
        .any(|window| window == REMLOGIC_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn patient_dir(files: &[(&str, &[u8])]) -> TempDir {
        let dir = TempDir::new().unwrap();
        let patient = dir.path().join("PA0001");
        std::fs::create_dir(&patient).unwrap();
        for (name, content) in files {
            std::fs::write(patient.join(name), content).unwrap();
        }
        dir
    }

    #[test]
    fn rtf_beats_csv() {
        let dir = patient_dir(&[("rec.rtf", b"{\\rtf1}"), ("rec.csv", b"")]);
        let device = detect_dialect(dir.path(), "PA0001", "rec").unwrap();
        assert_eq!(device, RecordingDevice::Deltamed);
    }

    #[test]
    fn txt_needs_remlogic_marker() {
        let dir = patient_dir(&[("rec.txt", b"Exported by RemLogic 3.4\n")]);
        assert_eq!(
            detect_dialect(dir.path(), "PA0001", "rec").unwrap(),
            RecordingDevice::RemLogic
        );
    }

    #[test]
    fn unmarked_txt_shadows_csv() {
        let dir = patient_dir(&[("rec.txt", b"something else\n"), ("rec.csv", b"")]);
        assert_eq!(
            detect_dialect(dir.path(), "PA0001", "rec").unwrap(),
            RecordingDevice::Unknown
        );
    }

    #[test]
    fn csv_alone_is_brainrt() {
        let dir = patient_dir(&[("rec.csv", b"")]);
        assert_eq!(
            detect_dialect(dir.path(), "PA0001", " rec ").unwrap(),
            RecordingDevice::BrainRt
        );
    }

    #[test]
    fn nothing_found_is_unknown() {
        let dir = patient_dir(&[("other.rtf", b"")]);
        assert_eq!(
            detect_dialect(dir.path(), "PA0001", "rec").unwrap(),
            RecordingDevice::Unknown
        );
    }
}
