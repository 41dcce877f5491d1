//! Subject identifiers derived from EDF file names.
//!
//! Recording files are named like `FE0012T1-PA0042V1C1.edf`: recording
//! `FE0012`, patient `PA0042`, visit `V1`.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static PATIENT_VISIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"PA(\d+)(?:_?V(\d+))?").expect("Invalid patient regex"));

static RECORDING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"FE(\d+)").expect("Invalid recording regex"));

/// Numeric parts of a recording file name, as written (leading zeros kept).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingName {
    pub patient: String,
    pub visit: Option<String>,
    pub recording: Option<String>,
}

impl RecordingName {
    /// Parses patient, visit and recording numbers from `name`.
    ///
    /// Without a patient number nothing else is reported either.
    pub fn parse(name: &str) -> Self {
        let Some(caps) = PATIENT_VISIT_REGEX.captures(name) else {
            return Self::default();
        };
        Self {
            patient: caps[1].to_string(),
            visit: caps.get(2).map(|m| m.as_str().to_string()),
            recording: recording_number(name),
        }
    }

    /// `PA<patient>[_V<visit>][_FE<recording>]`.
    pub fn subject_id(&self) -> String {
        let mut id = format!("PA{}", self.patient);
        if let Some(visit) = &self.visit {
            id.push_str("_V");
            id.push_str(visit);
        }
        if let Some(recording) = &self.recording {
            id.push_str("_FE");
            id.push_str(recording);
        }
        id
    }
}

/// Digits following `FE` in `name`.
pub fn recording_number(name: &str) -> Option<String> {
    RECORDING_REGEX
        .captures(name)
        .map(|caps| caps[1].to_string())
}

/// Subject id of an EDF file, from its stem.
pub fn subject_id_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default();
    RecordingName::parse(&stem).subject_id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_recording_name() {
        let name = RecordingName::parse("FE0012T1-PA0042V1C1");
        assert_eq!(name.patient, "0042");
        assert_eq!(name.visit.as_deref(), Some("1"));
        assert_eq!(name.recording.as_deref(), Some("0012"));
        assert_eq!(name.subject_id(), "PA0042_V1_FE0012");
    }

    #[test]
    fn optional_parts_are_omitted() {
        assert_eq!(RecordingName::parse("T1-PA7 night").subject_id(), "PA7");
        assert_eq!(RecordingName::parse("PA7_V2").subject_id(), "PA7_V2");
        assert_eq!(
            subject_id_from_path(Path::new("/data/2024/PA0042/FE3T1-PA0042V2C1.edf")),
            "PA0042_V2_FE3"
        );
    }

    #[test]
    fn no_patient_means_no_parts() {
        let name = RecordingName::parse("FE0012T1-recording");
        assert_eq!(name, RecordingName::default());
        assert_eq!(name.subject_id(), "PA");
    }
}
