//! BrainRT exports: a UTF-16 CSV event report plus stages embedded in the EDF+.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use psg_edf::{EdfAnnotation, EdfDecoder};
use psg_model::{EPOCH_SECONDS, EventTable, NormalizedEvent, RawEvent, RecordingDevice};
use psg_transform::{seconds_since, shift_seconds};

use super::AnnotationDialect;
use crate::detect::annotation_path;
use crate::error::{IngestError, Result};
use crate::text::{parse_datetime, read_utf16};

/// Date and time columns joined with `-`.
pub const CSV_DATETIME_FORMAT: &str = "%d/%m/%Y-%H:%M:%S";

const DATE_COLUMN: &str = "Start Date/Time: Date";
const TIME_COLUMN: &str = "Start Date/Time: Time - HH:MM:SS";
const DURATION_COLUMN: &str = "Duration (total µs)";
const LABEL_COLUMN: &str = "Subtype";
const VALIDATED_COLUMN: &str = "Validated";
const DETAIL_COLUMNS: &[&str] = &["Type", "Description"];

const MICROS_PER_SECOND: f64 = 1e6;

const EDF_STAGE_PREFIX: &str = "Sleep";
const EDF_LIMB_PREFIX: &str = "Limb";
const EDF_VALIDATED: &str = "Yes";

/// BrainRT dialect; the decoder reads stage annotations from the EDF+ file.
pub struct BrainRt<'a> {
    decoder: &'a dyn EdfDecoder,
}

impl<'a> BrainRt<'a> {
    pub fn new(decoder: &'a dyn EdfDecoder) -> Self {
        Self { decoder }
    }

    /// Parses the CSV event report; offsets count from its first row.
    pub fn parse_csv(&self, path: &Path) -> Result<EventTable> {
        let text = read_utf16(path)?;
        let csv_error = |source: csv::Error| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(text.as_bytes());
        let headers = reader.headers().map_err(csv_error)?.clone();
        let find = |name: &str| headers.iter().position(|header| header.trim() == name);
        let require = |name: &'static str| {
            find(name).ok_or_else(|| IngestError::MissingColumn {
                column: name,
                path: path.to_path_buf(),
            })
        };
        let date_col = require(DATE_COLUMN)?;
        let time_col = require(TIME_COLUMN)?;
        let duration_col = require(DURATION_COLUMN)?;
        let label_col = require(LABEL_COLUMN)?;
        let validated_col = find(VALIDATED_COLUMN);
        let detail_cols: Vec<(&str, usize)> = DETAIL_COLUMNS
            .iter()
            .filter_map(|name| find(*name).map(|index| (*name, index)))
            .collect();

        let mut rows: Vec<(RawEvent, NaiveDateTime)> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            let cell = |index: usize| record.get(index).unwrap_or_default();
            let time_text = cell(time_col).trim();
            let start_ts = parse_datetime(
                &format!("{}-{time_text}", cell(date_col).trim()),
                CSV_DATETIME_FORMAT,
                path,
            )?;
            let raw = RawEvent {
                event_label: cell(label_col).to_string(),
                start_time_real: time_text.to_string(),
                duration: Some(parse_micros(cell(duration_col), path)?),
                scoring_channel: None,
                validated: validated_col.map(|index| cell(index).to_string()),
                details: detail_cols
                    .iter()
                    .map(|(name, index)| ((*name).to_string(), cell(*index).to_string()))
                    .collect::<BTreeMap<_, _>>(),
            };
            rows.push((raw, start_ts));
        }

        let origin = rows.first().map(|(_, start_ts)| *start_ts);
        let events: Vec<NormalizedEvent> = rows
            .into_iter()
            .map(|(raw, start_ts)| {
                let start_sec = origin.map_or(0.0, |origin| seconds_since(origin, start_ts));
                NormalizedEvent::from_raw(raw, start_ts, start_sec)
            })
            .collect();
        Ok(events.into())
    }
}

impl AnnotationDialect for BrainRt<'_> {
    fn device(&self) -> RecordingDevice {
        RecordingDevice::BrainRt
    }

    /// CSV rows followed by the EDF+ stage and limb annotations, unsorted.
    fn parse(&self, dir: &Path, patient: &str, base: &str) -> Result<EventTable> {
        let mut table = self.parse_csv(&annotation_path(dir, patient, base, "csv"))?;
        let csv_rows = table.len();
        let edf_path = annotation_path(dir, patient, base, "edf");
        match self.decoder.decode(&edf_path, true) {
            Ok(recording) => {
                let embedded = edf_events(recording.header.start, &recording.annotations);
                table.append(embedded.into());
            }
            Err(err) => {
                warn!(
                    patient,
                    file = %edf_path.display(),
                    error = %err,
                    "annotation reading from EDF header failed, keeping CSV rows"
                );
            }
        }
        debug!(
            patient,
            csv_rows,
            events = table.len(),
            "parsed BrainRT annotations"
        );
        Ok(table)
    }
}

/// Converts EDF+ annotations to validated events on the recording clock.
///
/// Stage annotations longer than one epoch are split into whole epochs;
/// a trailing partial epoch is dropped. Annotations whose onset cannot be
/// placed on the recording clock are skipped.
pub fn edf_events(
    recording_start: NaiveDateTime,
    annotations: &[EdfAnnotation],
) -> Vec<NormalizedEvent> {
    let mut events = Vec::new();
    for annotation in annotations {
        let duration = annotation.duration.unwrap_or(0.0);
        let is_stage = annotation.label.starts_with(EDF_STAGE_PREFIX);
        if is_stage && duration > EPOCH_SECONDS {
            if shift_seconds(recording_start, annotation.onset + duration).is_none() {
                warn!(
                    label = %annotation.label,
                    onset = annotation.onset,
                    duration,
                    "skipping EDF stage annotation past the recording clock"
                );
                continue;
            }
            let epochs = (duration / EPOCH_SECONDS).floor() as usize;
            for epoch in 0..epochs {
                let onset = annotation.onset + epoch as f64 * EPOCH_SECONDS;
                events.extend(edf_event(
                    recording_start,
                    &annotation.label,
                    onset,
                    EPOCH_SECONDS,
                ));
            }
        } else if is_stage || annotation.label.starts_with(EDF_LIMB_PREFIX) {
            events.extend(edf_event(
                recording_start,
                &annotation.label,
                annotation.onset,
                duration,
            ));
        }
    }
    events
}

fn edf_event(
    recording_start: NaiveDateTime,
    label: &str,
    onset: f64,
    duration: f64,
) -> Option<NormalizedEvent> {
    let Some(start_ts) = shift_seconds(recording_start, onset) else {
        warn!(label, onset, "skipping EDF annotation with out of range onset");
        return None;
    };
    let raw = RawEvent {
        event_label: label.to_string(),
        duration: Some(duration),
        validated: Some(EDF_VALIDATED.to_string()),
        ..RawEvent::default()
    };
    Some(NormalizedEvent::from_raw(raw, start_ts, onset))
}

/// Microseconds to seconds; empty and NaN cells are zero, infinite values
/// are rejected.
fn parse_micros(value: &str, path: &Path) -> Result<f64> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0.0);
    }
    let invalid = || IngestError::InvalidValue {
        field: "duration",
        value: value.to_string(),
        path: path.to_path_buf(),
    };
    let micros = value.parse::<f64>().map_err(|_| invalid())?;
    if micros.is_nan() {
        return Ok(0.0);
    }
    if micros.is_infinite() {
        return Err(invalid());
    }
    Ok(micros / MICROS_PER_SECOND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap()
    }

    fn annotation(onset: f64, duration: Option<f64>, label: &str) -> EdfAnnotation {
        EdfAnnotation {
            onset,
            duration,
            label: label.to_string(),
        }
    }

    #[test]
    fn long_stages_split_into_epochs() {
        let events = edf_events(start(), &[annotation(100.0, Some(90.0), "Sleep stage N2")]);
        let offsets: Vec<f64> = events.iter().map(|e| e.start_sec).collect();
        assert_eq!(offsets, vec![100.0, 130.0, 160.0]);
        assert!(events.iter().all(|e| e.duration == 30.0));
        assert!(events.iter().all(|e| e.validated.as_deref() == Some("Yes")));
        assert_eq!(events[2].start_ts, start() + chrono::TimeDelta::seconds(160));
    }

    #[test]
    fn partial_epochs_are_dropped() {
        let events = edf_events(start(), &[annotation(0.0, Some(75.0), "Sleep stage W")]);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn short_stages_and_limb_movements_are_kept() {
        let events = edf_events(
            start(),
            &[
                annotation(0.0, Some(30.0), "Sleep stage W"),
                annotation(12.5, None, "Limb movement : Mouvement de la jambe gauche"),
                annotation(20.0, Some(10.0), "Desaturation"),
            ],
        );
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].start_sec, 12.5);
        assert_eq!(events[1].duration, 0.0);
    }

    #[test]
    fn micros_convert_to_seconds() {
        let path = PathBuf::from("rec.csv");
        assert_eq!(parse_micros("15000000", &path).unwrap(), 15.0);
        assert_eq!(parse_micros("", &path).unwrap(), 0.0);
        assert_eq!(parse_micros("NaN", &path).unwrap(), 0.0);
        assert!(parse_micros("15 s", &path).is_err());
        assert!(parse_micros("inf", &path).is_err());
        assert!(parse_micros("-inf", &path).is_err());
        assert_eq!(parse_micros("1e30", &path).unwrap(), 1e24);
    }

    #[test]
    fn out_of_range_onsets_are_skipped() {
        let events = edf_events(
            start(),
            &[
                annotation(1e13, Some(30.0), "Sleep stage N2"),
                annotation(1e15, Some(90.0), "Sleep stage N3"),
                annotation(0.0, Some(1e300), "Sleep stage N1"),
                annotation(30.0, Some(30.0), "Sleep stage W"),
            ],
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].label, "Sleep stage W");
    }
}
