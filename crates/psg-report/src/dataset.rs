//! Dataset folder layout.
//!
//! ```text
//! <out>/<dataset>/<series>/<subject>/
//!     metadata.json
//!     original_annotations.json
//!     manual_hypnogram.json
//!     manual_aasmevents.json
//!     sample_arrays/<channel>/attributes.json
//!     sample_arrays/<channel>/data.f32
//! <out>/conversion_error_counts.json
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info};

use psg_core::{Dataset, SampleArray, Series, Subject};
use psg_model::{ErrorCounts, RecordingDevice};

use crate::error::{ReportError, Result};
use crate::json::{create_dir, write_f32_le, write_json};

pub const METADATA_FILE: &str = "metadata.json";
pub const ORIGINAL_ANNOTATIONS_FILE: &str = "original_annotations.json";
pub const HYPNOGRAM_FILE: &str = "manual_hypnogram.json";
pub const AASM_EVENTS_FILE: &str = "manual_aasmevents.json";
pub const SAMPLE_ARRAYS_DIR: &str = "sample_arrays";
pub const ATTRIBUTES_FILE: &str = "attributes.json";
pub const SAMPLE_DATA_FILE: &str = "data.f32";
pub const ERROR_COUNTS_FILE: &str = "conversion_error_counts.json";

/// Options for dataset writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Write channel samples next to their attributes.
    pub sample_data: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { sample_data: true }
    }
}

/// Counts of what was written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub subjects: usize,
    pub sample_arrays: usize,
    pub annotated_subjects: usize,
}

#[derive(Serialize)]
struct MetadataDocument<'a> {
    subject_id: &'a str,
    recording_start_ts: NaiveDateTime,
    analysis_start: Option<NaiveDateTime>,
    analysis_end: Option<NaiveDateTime>,
    lights_off: Option<NaiveDateTime>,
    lights_on: Option<NaiveDateTime>,
    additional_info: AdditionalInfo,
}

#[derive(Serialize)]
struct AdditionalInfo {
    recording_device: RecordingDevice,
}

/// Writes every series of `dataset` under `out_dir/<dataset name>`, then
/// merges the series error counts into `out_dir/conversion_error_counts.json`.
pub fn write_dataset(
    dataset: &Dataset,
    out_dir: &Path,
    options: WriteOptions,
) -> Result<WriteSummary> {
    let dataset_dir = out_dir.join(&dataset.name);
    info!(
        dataset = %dataset.name,
        output = %dataset_dir.display(),
        "writing dataset"
    );
    let mut summary = WriteSummary::default();
    for series in dataset.series.values() {
        let written = write_series(series, &dataset_dir, options)?;
        summary.subjects += written.subjects;
        summary.sample_arrays += written.sample_arrays;
        summary.annotated_subjects += written.annotated_subjects;
    }
    write_error_counts(out_dir, &dataset.error_counts())?;
    Ok(summary)
}

pub fn write_series(
    series: &Series,
    dataset_dir: &Path,
    options: WriteOptions,
) -> Result<WriteSummary> {
    let series_dir = dataset_dir.join(&series.name);
    create_dir(&series_dir)?;
    let mut summary = WriteSummary::default();
    for subject in series.subjects.values() {
        summary.sample_arrays += write_subject(subject, &series_dir, options)?;
        summary.subjects += 1;
        if subject.annotations.is_some() {
            summary.annotated_subjects += 1;
        }
    }
    info!(
        series = %series.name,
        subjects = summary.subjects,
        "series written"
    );
    Ok(summary)
}

/// Writes one subject folder. Returns the number of sample arrays written.
pub fn write_subject(subject: &Subject, series_dir: &Path, options: WriteOptions) -> Result<usize> {
    let subject_dir = series_dir.join(subject.id());
    create_dir(&subject_dir)?;

    let metadata = &subject.metadata;
    write_json(
        &subject_dir.join(METADATA_FILE),
        &MetadataDocument {
            subject_id: &metadata.subject_id,
            recording_start_ts: metadata.recording_start_ts,
            analysis_start: metadata.analysis_start,
            analysis_end: metadata.analysis_end,
            lights_off: metadata.lights_off,
            lights_on: metadata.lights_on,
            additional_info: AdditionalInfo {
                recording_device: metadata.recording_device,
            },
        },
    )?;

    if let Some(annotations) = &subject.annotations {
        write_json(
            &subject_dir.join(ORIGINAL_ANNOTATIONS_FILE),
            &annotations.original,
        )?;
        write_json(&subject_dir.join(HYPNOGRAM_FILE), &annotations.hypnogram)?;
        write_json(&subject_dir.join(AASM_EVENTS_FILE), &annotations.events)?;
    }

    let arrays_dir = subject_dir.join(SAMPLE_ARRAYS_DIR);
    for array in subject.sample_arrays.values() {
        write_sample_array(subject.id(), array, &arrays_dir, options)?;
    }
    debug!(
        subject_id = %subject.id(),
        sample_arrays = subject.sample_arrays.len(),
        annotated = subject.annotations.is_some(),
        "subject written"
    );
    Ok(subject.sample_arrays.len())
}

fn write_sample_array(
    subject_id: &str,
    array: &SampleArray,
    arrays_dir: &Path,
    options: WriteOptions,
) -> Result<()> {
    let array_dir = arrays_dir.join(array.name());
    create_dir(&array_dir)?;
    write_json(&array_dir.join(ATTRIBUTES_FILE), &array.attributes)?;
    if options.sample_data {
        let samples = array.load().map_err(|source| ReportError::SampleLoad {
            subject_id: subject_id.to_string(),
            channel: array.name().to_string(),
            source,
        })?;
        write_f32_le(&array_dir.join(SAMPLE_DATA_FILE), &samples)?;
    }
    Ok(())
}

/// Merges `counts` into the error-count file of `out_dir`.
///
/// Series already recorded in the file are replaced; others are kept.
pub fn write_error_counts(
    out_dir: &Path,
    counts: &BTreeMap<String, ErrorCounts>,
) -> Result<PathBuf> {
    create_dir(out_dir)?;
    let path = out_dir.join(ERROR_COUNTS_FILE);
    let mut merged = read_error_counts(&path)?;
    merged.extend(counts.iter().map(|(series, counts)| (series.clone(), *counts)));
    write_json(&path, &merged)?;
    info!(path = %path.display(), series = merged.len(), "wrote error counts");
    Ok(path)
}

/// Reads an error-count file; a missing file is empty.
pub fn read_error_counts(path: &Path) -> Result<BTreeMap<String, ErrorCounts>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(source) => {
            return Err(ReportError::Io {
                operation: "read",
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_slice(&bytes).map_err(|source| ReportError::ErrorCountsFormat {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use psg_model::ConversionFailure;
    use tempfile::tempdir;

    #[test]
    fn error_counts_merge_by_series() {
        let dir = tempdir().unwrap();
        let mut first = ErrorCounts::default();
        first.record(ConversionFailure::NoEdfFound);
        write_error_counts(
            dir.path(),
            &BTreeMap::from([("2023".to_string(), first), ("2024".to_string(), first)]),
        )
        .unwrap();

        let mut second = ErrorCounts::default();
        second.record(ConversionFailure::AnnotationParseFailed);
        let path =
            write_error_counts(dir.path(), &BTreeMap::from([("2024".to_string(), second)]))
                .unwrap();

        let counts = read_error_counts(&path).unwrap();
        assert_eq!(counts["2023"], first);
        assert_eq!(counts["2024"], second);
    }
}
