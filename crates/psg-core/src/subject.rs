//! Converted subjects, series and datasets.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use psg_edf::SignalLoader;
use psg_model::{AnnotationSet, ErrorCounts, RecordingMetadata};

/// Metadata of one signal channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayAttributes {
    /// Sanitized channel label, usable as a path component.
    pub name: String,
    pub start_ts: NaiveDateTime,
    pub sampling_rate: f64,
    pub unit: String,
    pub sensor_info: String,
    pub amplifier_info: String,
}

/// A signal channel whose samples stay on disk until [`SampleArray::load`].
#[derive(Debug, Clone, PartialEq)]
pub struct SampleArray {
    pub attributes: ArrayAttributes,
    loader: SignalLoader,
}

impl SampleArray {
    pub fn new(loader: SignalLoader, start_ts: NaiveDateTime) -> Self {
        let header = loader.header();
        let attributes = ArrayAttributes {
            name: channel_name(&header.label),
            start_ts,
            sampling_rate: loader.sample_frequency(),
            unit: header.physical_dimension.trim().to_string(),
            sensor_info: header.transducer.trim().to_string(),
            amplifier_info: header.prefilter.trim().to_string(),
        };
        Self { attributes, loader }
    }

    pub fn name(&self) -> &str {
        &self.attributes.name
    }

    pub fn sample_count(&self) -> usize {
        self.loader.sample_count()
    }

    /// Reads the physical samples from the EDF file.
    pub fn load(&self) -> psg_edf::Result<Vec<f32>> {
        self.loader.load()
    }
}

/// Channel label with `/` replaced and `?` and `.` removed.
pub fn channel_name(label: &str) -> String {
    label
        .chars()
        .filter(|c| !matches!(c, '?' | '.'))
        .map(|c| if c == '/' { '_' } else { c })
        .collect()
}

/// One converted recording.
#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    pub metadata: RecordingMetadata,
    /// Keyed by sanitized channel name.
    pub sample_arrays: BTreeMap<String, SampleArray>,
    /// `None` when no annotation export was found or parseable.
    pub annotations: Option<AnnotationSet>,
}

impl Subject {
    pub fn id(&self) -> &str {
        &self.metadata.subject_id
    }
}

/// Subjects converted from one series folder (usually one year).
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub subjects: BTreeMap<String, Subject>,
    pub error_counts: ErrorCounts,
}

impl Series {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subjects: BTreeMap::new(),
            error_counts: ErrorCounts::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub series: BTreeMap<String, Series>,
}

impl Dataset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            series: BTreeMap::new(),
        }
    }

    /// Error counts of every series, keyed by series name.
    pub fn error_counts(&self) -> BTreeMap<String, ErrorCounts> {
        self.series
            .iter()
            .map(|(name, series)| (name.clone(), series.error_counts))
            .collect()
    }

    pub fn subject_count(&self) -> usize {
        self.series.values().map(Series::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_names_are_path_safe() {
        assert_eq!(channel_name("EEG C3/A2"), "EEG C3_A2");
        assert_eq!(channel_name("SpO2 ?."), "SpO2 ");
        assert_eq!(channel_name("Pos."), "Pos");
    }
}
