//! Recording inventory of a remote patient folder.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Prefix of converted subject folders uploaded next to the raw files.
pub const SLF_FOLDER_PREFIX: &str = "slf_";

static PRIMARY_PSG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"FE(\d+)T1-PA\w+V(\d+)C\d+").expect("Invalid recording file regex")
});

/// Visit and recording number of one primary PSG recording.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordingKey {
    /// `V<visit>`.
    pub visit: String,
    /// `FE<recording>`.
    pub recording: String,
}

impl RecordingKey {
    /// `V<visit>_FE<recording>`, the suffix of the subject id.
    pub fn suffix(&self) -> String {
        format!("{}_{}", self.visit, self.recording)
    }

    /// Whether `file` is one of the raw files of this recording.
    pub fn matches_file(&self, file: &str) -> bool {
        file.contains(&format!("{}C", self.visit))
            && file.contains(&format!("{}T", self.recording))
    }
}

impl fmt::Display for RecordingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.visit, self.recording)
    }
}

/// Primary PSG recordings named by the `.edf` files in `files`, sorted.
pub fn extract_recording_values<S: AsRef<str>>(files: &[S]) -> Vec<RecordingKey> {
    files
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| name.to_lowercase().ends_with(".edf"))
        .filter_map(|name| PRIMARY_PSG_REGEX.captures(name))
        .map(|caps| RecordingKey {
            visit: format!("V{}", &caps[2]),
            recording: format!("FE{}", &caps[1]),
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Conversion state of one patient folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientStatus {
    /// Every primary PSG recording has a converted folder.
    pub all_converted: bool,
    /// Recordings without a converted folder.
    pub missing: Vec<RecordingKey>,
    /// At least one primary PSG recording exists.
    pub has_valid_psg: bool,
}

/// Compares the recordings in a patient folder listing with its `slf_*`
/// folders.
pub fn check_patient_recordings<S: AsRef<str>>(files: &[S]) -> PatientStatus {
    let expected = extract_recording_values(files);
    if expected.is_empty() {
        return PatientStatus {
            all_converted: true,
            missing: Vec::new(),
            has_valid_psg: false,
        };
    }
    let slf_folders: Vec<&str> = files
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| name.starts_with(SLF_FOLDER_PREFIX))
        .collect();
    let missing: Vec<RecordingKey> = expected
        .into_iter()
        .filter(|key| {
            let suffix = key.suffix();
            !slf_folders.iter().any(|folder| folder.contains(&suffix))
        })
        .collect();
    PatientStatus {
        all_converted: missing.is_empty(),
        missing,
        has_valid_psg: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(visit: &str, recording: &str) -> RecordingKey {
        RecordingKey {
            visit: visit.to_string(),
            recording: recording.to_string(),
        }
    }

    #[test]
    fn recordings_come_from_primary_edf_files() {
        let files = [
            "FE0002T1-PA0042V2C1.edf",
            "FE0001T1-PA0042V1C1.EDF",
            "FE0001T1-PA0042V1C1.txt",
            "FE0003T2-PA0042V1C1.edf",
            "FE0001T1-PA0042V1C1.edf",
        ];
        assert_eq!(
            extract_recording_values(&files),
            vec![key("V1", "FE0001"), key("V2", "FE0002")]
        );
    }

    #[test]
    fn status_reports_missing_recordings() {
        let files = [
            "FE0001T1-PA0042V1C1.edf",
            "FE0002T1-PA0042V2C1.edf",
            "slf_PA0042_V1_FE0001",
        ];
        let status = check_patient_recordings(&files);
        assert!(status.has_valid_psg);
        assert!(!status.all_converted);
        assert_eq!(status.missing, vec![key("V2", "FE0002")]);
    }

    #[test]
    fn folder_without_psg_counts_as_converted() {
        let status = check_patient_recordings(&["FE0003T2-PA0042V1C1.edf", "notes.txt"]);
        assert!(status.all_converted);
        assert!(!status.has_valid_psg);
    }

    #[test]
    fn raw_files_match_by_visit_and_recording() {
        let key = key("V1", "FE0001");
        assert!(key.matches_file("FE0001T1-PA0042V1C1.rtf"));
        assert!(!key.matches_file("FE0001T1-PA0042V2C1.rtf"));
        assert_eq!(key.suffix(), "V1_FE0001");
        assert_eq!(key.to_string(), "(V1, FE0001)");
    }
}
