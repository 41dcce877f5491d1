//! Subject assembly: EDF decoding, annotation loading, reconciliation and
//! classification for every recording of a series.
//!
//! Series folders hold one folder per patient; each patient folder holds the
//! EDF recordings and their annotation exports side by side. Per-recording
//! failures are tallied in the [`ConversionContext`] and never abort the
//! series.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, info, info_span, warn};

use psg_edf::EdfDecoder;
use psg_ingest::load_annotation;
use psg_model::{AnnotationSet, ConversionFailure, RecordingDevice, RecordingMetadata};
use psg_transform::{TimelineMarkers, classify, reconcile};

use crate::context::ConversionContext;
use crate::error::{CoreError, Result};
use crate::subject::{Dataset, SampleArray, Series, Subject};
use crate::subject_id::subject_id_from_path;

/// File name fragment of primary PSG recordings; other EDFs are MSLT/MWT.
pub const PRIMARY_PSG_MARKER: &str = "T1-";

/// Signals of one decoded EDF file.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSignals {
    pub start_ts: NaiveDateTime,
    pub sample_arrays: BTreeMap<String, SampleArray>,
}

/// Annotations of one recording after reconciliation and classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingAnnotations {
    pub device: RecordingDevice,
    pub markers: TimelineMarkers,
    pub annotations: Option<AnnotationSet>,
}

impl RecordingAnnotations {
    fn unavailable(device: RecordingDevice) -> Self {
        Self {
            device,
            markers: TimelineMarkers::default(),
            annotations: None,
        }
    }
}

/// Converts the named series of `input_dir` into one dataset.
pub fn convert_dataset(
    input_dir: &Path,
    dataset_name: &str,
    series_names: &[String],
    decoder: &dyn EdfDecoder,
    ctx: &mut ConversionContext,
) -> Result<Dataset> {
    info!(
        input_dir = %input_dir.display(),
        dataset = dataset_name,
        series = series_names.len(),
        "converting dataset"
    );
    let mut dataset = Dataset::new(dataset_name);
    for name in series_names {
        let series = read_series(&input_dir.join(name), name, decoder, ctx)?;
        dataset.series.insert(name.clone(), series);
    }
    Ok(dataset)
}

/// Reads every patient folder of `series_dir`.
pub fn read_series(
    series_dir: &Path,
    name: &str,
    decoder: &dyn EdfDecoder,
    ctx: &mut ConversionContext,
) -> Result<Series> {
    let series_span = info_span!("series", series = name);
    let _series_guard = series_span.enter();

    if !series_dir.is_dir() {
        return Err(CoreError::SeriesNotFound {
            path: series_dir.to_path_buf(),
        });
    }

    let mut series = Series::new(name);
    for patient_dir in list_dirs(series_dir)? {
        read_patient(&patient_dir, &mut series, decoder, ctx);
    }
    series.error_counts = ctx.error_counts(name);

    info!(
        subjects = series.len(),
        errors = series.error_counts.total(),
        "series converted"
    );
    Ok(series)
}

fn read_patient(
    patient_dir: &Path,
    series: &mut Series,
    decoder: &dyn EdfDecoder,
    ctx: &mut ConversionContext,
) {
    let patient = file_name(patient_dir);
    let subject_span = info_span!("subject", patient = %patient);
    let _subject_guard = subject_span.enter();

    let edf_files = match list_edf_files(patient_dir) {
        Ok(files) => files,
        Err(err) => {
            warn!(patient = %patient, error = %err, "skipping unreadable patient folder");
            ctx.record_failure(&series.name, ConversionFailure::NoEdfFound);
            return;
        }
    };
    if edf_files.is_empty() {
        warn!(patient = %patient, "skipping subject with no .edf file");
        ctx.record_failure(&series.name, ConversionFailure::NoEdfFound);
        return;
    }
    info!(recordings = edf_files.len(), "parsing subject");

    for edf_path in edf_files {
        let file = file_name(&edf_path);
        if !file.contains(PRIMARY_PSG_MARKER) {
            debug!(file = %file, "not a primary PSG recording");
            continue;
        }
        let subject_id = subject_id_from_path(&edf_path);
        if ctx.is_converted(&subject_id) {
            info!(subject_id = %subject_id, file = %file, "already converted");
            continue;
        }

        let recording_span = info_span!("recording", subject_id = %subject_id);
        let _recording_guard = recording_span.enter();

        let signals = match read_signals(&edf_path, decoder) {
            Ok(signals) => signals,
            Err(err) => {
                warn!(
                    subject_id = %subject_id,
                    file = %file,
                    error = %err,
                    "skipping unreadable EDF"
                );
                ctx.record_failure(&series.name, ConversionFailure::EdfDecodeFailed);
                continue;
            }
        };

        let recording = match read_annotations(patient_dir, &edf_path, signals.start_ts, decoder)
        {
            Ok(recording) => recording,
            Err(err) => {
                warn!(
                    subject_id = %subject_id,
                    file = %file,
                    error = %err,
                    "annotation parsing failed"
                );
                ctx.record_failure(&series.name, ConversionFailure::AnnotationParseFailed);
                RecordingAnnotations::unavailable(RecordingDevice::Unknown)
            }
        };

        let subject = assemble_subject(subject_id, signals, recording);
        series.subjects.insert(subject.id().to_string(), subject);
    }
}

/// Decodes the EDF header and wraps each signal in a lazy [`SampleArray`].
pub fn read_signals(
    edf_path: &Path,
    decoder: &dyn EdfDecoder,
) -> psg_edf::Result<RecordingSignals> {
    let recording = decoder.decode(edf_path, false)?;
    let start_ts = recording.header.start;
    let sample_arrays = recording
        .signals
        .into_iter()
        .map(|loader| {
            let array = SampleArray::new(loader, start_ts);
            (array.name().to_string(), array)
        })
        .collect();
    Ok(RecordingSignals {
        start_ts,
        sample_arrays,
    })
}

/// Loads, reconciles and classifies the annotations of `edf_path`.
///
/// When nothing is found under the full EDF stem, the first
/// whitespace-separated token of the stem is tried.
pub fn read_annotations(
    patient_dir: &Path,
    edf_path: &Path,
    recording_start: NaiveDateTime,
    decoder: &dyn EdfDecoder,
) -> psg_ingest::Result<RecordingAnnotations> {
    let study_dir = patient_dir.parent().unwrap_or(Path::new("."));
    let patient = file_name(patient_dir);
    let stem = edf_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut loaded = load_annotation(study_dir, &patient, &stem, decoder)?;
    let has_events = loaded
        .events
        .as_ref()
        .is_some_and(|table| !table.is_empty());
    if !has_events
        && let Some(token) = stem.split_whitespace().next()
        && token != stem
    {
        debug!(base = token, "retrying annotation lookup with first name token");
        loaded = load_annotation(study_dir, &patient, token, decoder)?;
    }

    let Some(mut table) = loaded.events.filter(|table| !table.is_empty()) else {
        warn!(patient = %patient, file = %stem, "cannot find annotations");
        return Ok(RecordingAnnotations::unavailable(loaded.device));
    };

    let markers = reconcile(&mut table, recording_start);
    let annotations = classify(&table);
    debug!(
        device = %loaded.device,
        original = annotations.original.len(),
        stages = annotations.hypnogram.len(),
        events = annotations.events.len(),
        "annotations classified"
    );
    Ok(RecordingAnnotations {
        device: loaded.device,
        markers,
        annotations: Some(annotations),
    })
}

fn assemble_subject(
    subject_id: String,
    signals: RecordingSignals,
    recording: RecordingAnnotations,
) -> Subject {
    let markers = recording.markers;
    Subject {
        metadata: RecordingMetadata {
            subject_id,
            recording_start_ts: signals.start_ts,
            analysis_start: markers.analysis_start,
            analysis_end: markers.analysis_end,
            lights_off: markers.lights_off,
            lights_on: markers.lights_on,
            recording_device: recording.device,
        },
        sample_arrays: signals.sample_arrays,
        annotations: recording.annotations,
    }
}

fn list_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = read_dir(dir)?
        .into_iter()
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// `.edf` files of `dir`, extension matched case-insensitively, sorted.
pub fn list_edf_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = read_dir(dir)?
        .into_iter()
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("edf"))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn read_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let io_error = |source: std::io::Error| CoreError::Io {
        operation: "list",
        path: dir.to_path_buf(),
        source,
    };
    fs::read_dir(dir)
        .map_err(io_error)?
        .map(|entry| entry.map(|entry| entry.path()).map_err(io_error))
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn edf_listing_ignores_case_and_other_files() {
        let dir = tempdir().unwrap();
        for name in ["b.EDF", "a.edf", "a.txt", "c.edf.bak"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("d.edf")).unwrap();

        let names: Vec<String> = list_edf_files(dir.path())
            .unwrap()
            .iter()
            .map(PathBuf::as_path)
            .map(file_name)
            .collect();
        assert_eq!(names, vec!["a.edf", "b.EDF"]);
    }

    #[test]
    fn unreadable_patient_folder_is_counted_and_skipped() {
        let dir = tempdir().unwrap();
        let mut ctx = ConversionContext::default();
        let mut series = Series::new("2024");
        read_patient(
            &dir.path().join("PA0042"),
            &mut series,
            &psg_edf::EdfFileDecoder,
            &mut ctx,
        );
        assert!(series.subjects.is_empty());
        assert_eq!(ctx.error_counts("2024").edf_does_not_exist, 1);
    }

    #[test]
    fn missing_series_is_an_error() {
        let dir = tempdir().unwrap();
        let mut ctx = ConversionContext::default();
        let err = read_series(
            &dir.path().join("2024"),
            "2024",
            &psg_edf::EdfFileDecoder,
            &mut ctx,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::SeriesNotFound { .. }));
    }
}
