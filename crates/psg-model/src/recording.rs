use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Annotation export dialect detected for a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordingDevice {
    /// RTF event log paired with a TXT stage log.
    Deltamed,
    /// Tab separated RemLogic text export.
    RemLogic,
    /// UTF-16 CSV export plus EDF+ embedded stages.
    #[serde(rename = "BrainRT")]
    BrainRt,
    /// No annotation file found, or none recognized.
    Unknown,
}

impl RecordingDevice {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingDevice::Deltamed => "Deltamed",
            RecordingDevice::RemLogic => "RemLogic",
            RecordingDevice::BrainRt => "BrainRT",
            RecordingDevice::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for RecordingDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordingDevice {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deltamed" => Ok(RecordingDevice::Deltamed),
            "remlogic" => Ok(RecordingDevice::RemLogic),
            "brainrt" => Ok(RecordingDevice::BrainRt),
            "unknown" => Ok(RecordingDevice::Unknown),
            _ => Err(ModelError::UnknownDevice(s.to_string())),
        }
    }
}

/// Per-recording facts derived during assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    /// `PA<patient>[_V<visit>][_FE<recording>]`.
    pub subject_id: String,
    /// Start of the recording per the EDF header.
    pub recording_start_ts: NaiveDateTime,
    pub analysis_start: Option<NaiveDateTime>,
    pub analysis_end: Option<NaiveDateTime>,
    pub lights_off: Option<NaiveDateTime>,
    pub lights_on: Option<NaiveDateTime>,
    pub recording_device: RecordingDevice,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_name_matches_export_name() {
        assert_eq!(RecordingDevice::BrainRt.to_string(), "BrainRT");
        assert_eq!(
            "brainrt".parse::<RecordingDevice>().unwrap(),
            RecordingDevice::BrainRt
        );
        assert_eq!(
            serde_json::to_string(&RecordingDevice::BrainRt).unwrap(),
            "\"BrainRT\""
        );
    }
}
