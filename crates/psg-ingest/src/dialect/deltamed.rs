//! Deltamed exports: a TXT stage log paired with an RTF event log.

use std::collections::HashSet;
use std::path::Path;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use tracing::debug;

use psg_model::{EventTable, NormalizedEvent, RawEvent, RecordingDevice};
use psg_transform::{
    clamp_epoch_durations, cumulative_offsets, gap_durations, resolve_rollover, seconds_delta,
};

use super::{AnnotationDialect, TEXT_DATETIME_FORMAT};
use crate::detect::annotation_path;
use crate::error::{IngestError, Result};
use crate::rtf::{replace_control_sequences, rtf_to_text};
use crate::text::{parse_datetime, read_latin1};

/// Stage labels kept from the TXT log.
pub const STAGE_LABELS: &[&str] = &[
    "Veille",
    "Stade 1",
    "Stade 2",
    "Stade 3",
    "S. Paradoxal",
    "Indéterminé",
];

/// Marks the end of a recording block in the TXT log.
pub const STAGE_BLOCK_SEPARATOR: &str = "//";

/// Real-time column of the RTF log, prefixed with the TXT start date.
pub const RTF_DATETIME_FORMAT: &str = "%d/%m/%Y-%Hh%Mm%Ss";

const ELAPSED_FORMAT: &str = "%Hh%Mm%Ss";
const DURATION_FORMAT: &str = "%H:%M:%S";

const TXT_DATE_LINE: usize = 2;
const TXT_PREAMBLE_LINES: usize = 5;

const RTF_HEAD_LINES: usize = 15;
const RTF_TAIL_LINES: usize = 3;
const RTF_FIELD_COUNT: usize = 5;
const RTF_REAL_TIME_HEADER: &str = "Heure réelle";

#[derive(Debug, Clone, Copy, Default)]
pub struct Deltamed;

impl AnnotationDialect for Deltamed {
    fn device(&self) -> RecordingDevice {
        RecordingDevice::Deltamed
    }

    fn parse(&self, dir: &Path, patient: &str, base: &str) -> Result<EventTable> {
        let stage_log = StageLog::read(&annotation_path(dir, patient, base, "txt"))?;
        let mut table = read_event_log(&annotation_path(dir, patient, base, "rtf"), &stage_log)?;
        let rtf_rows = table.len();
        table.append(stage_log.stage_events());
        table.sort_by_offset();
        let duplicates = table.dedup_exact();
        debug!(
            patient,
            rtf_rows,
            events = table.len(),
            duplicates,
            "parsed Deltamed annotations"
        );
        Ok(table)
    }
}

#[derive(Debug)]
struct StageRow {
    time_text: String,
    label: String,
    at: NaiveDateTime,
}

/// The TXT stage log with every row placed on the right day.
#[derive(Debug)]
struct StageLog {
    date_text: String,
    reference: NaiveDateTime,
    rows: Vec<StageRow>,
}

impl StageLog {
    fn read(path: &Path) -> Result<Self> {
        let text = read_latin1(path)?;
        let lines: Vec<&str> = text.lines().collect();
        let date_text = lines
            .get(TXT_DATE_LINE)
            .map(|line| line.trim().to_string())
            .ok_or_else(|| IngestError::MissingPreamble {
                path: path.to_path_buf(),
                line: TXT_DATE_LINE,
            })?;

        let fields: Vec<(&str, &str)> = lines
            .iter()
            .skip(TXT_PREAMBLE_LINES)
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let mut parts = line.split('\t');
                let time = parts.next().unwrap_or_default().trim();
                let label = parts.next().unwrap_or_default();
                (time, label)
            })
            .collect();

        let Some((first_time, _)) = fields.first() else {
            return Err(IngestError::EmptyTable {
                path: path.to_path_buf(),
            });
        };
        let reference = parse_datetime(
            &format!("{date_text}-{first_time}"),
            TEXT_DATETIME_FORMAT,
            path,
        )?;

        let rows = fields
            .iter()
            .map(|(time, label)| {
                let naive =
                    parse_datetime(&format!("{date_text}-{time}"), TEXT_DATETIME_FORMAT, path)?;
                Ok(StageRow {
                    time_text: (*time).to_string(),
                    label: (*label).to_string(),
                    at: resolve_rollover(naive.time(), naive.date(), reference),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            date_text,
            reference,
            rows,
        })
    }

    /// Stage rows on the cumulative timeline.
    ///
    /// Durations come from the gap to the next stage or separator row and
    /// are capped at one epoch, so offsets skip recording interruptions.
    fn stage_events(&self) -> EventTable {
        let kept: Vec<&StageRow> = self
            .rows
            .iter()
            .filter(|row| {
                STAGE_LABELS.contains(&row.label.as_str()) || row.label == STAGE_BLOCK_SEPARATOR
            })
            .collect();
        let times: Vec<NaiveDateTime> = kept.iter().map(|row| row.at).collect();

        let (stages, gaps): (Vec<&StageRow>, Vec<f64>) = kept
            .into_iter()
            .zip(gap_durations(&times))
            .filter(|(row, gap)| row.label != STAGE_BLOCK_SEPARATOR && *gap != 0.0)
            .unzip();
        let durations = clamp_epoch_durations(&gaps);
        let offsets = cumulative_offsets(&durations);

        stages
            .into_iter()
            .zip(durations.into_iter().zip(offsets))
            .map(|(row, (duration, offset))| {
                let raw = RawEvent {
                    event_label: row.label.clone(),
                    start_time_real: row.time_text.clone(),
                    duration: Some(duration),
                    ..RawEvent::default()
                };
                let mut event =
                    NormalizedEvent::from_raw(raw, self.reference + seconds_delta(offset), offset);
                event.start_time_real = Some(row.at);
                event
            })
            .collect::<Vec<_>>()
            .into()
    }
}

/// Splits one RTF text line into the five event-log fields.
///
/// Over-long rows carry a description containing double spaces and no
/// duration; four-field rows lack only the duration.
fn split_event_row(line: &str) -> Option<Vec<String>> {
    let mut fields: Vec<String> = line
        .split("  ")
        .filter(|field| !field.is_empty())
        .map(str::to_string)
        .collect();
    if fields.len() > RTF_FIELD_COUNT {
        let description = fields[3..].join("-");
        fields.truncate(3);
        fields.push(description);
    }
    if fields.len() == RTF_FIELD_COUNT - 1 {
        fields.insert(3, String::new());
    }
    (fields.len() == RTF_FIELD_COUNT).then_some(fields)
}

fn read_event_log(path: &Path, stage_log: &StageLog) -> Result<EventTable> {
    let text = replace_control_sequences(&rtf_to_text(&read_latin1(path)?));
    let lines: Vec<&str> = text.split('\n').collect();
    let body = lines
        .get(RTF_HEAD_LINES..lines.len().saturating_sub(RTF_TAIL_LINES))
        .unwrap_or_default();

    let mut seen = HashSet::new();
    let rows: Vec<Vec<String>> = body
        .iter()
        .filter_map(|line| split_event_row(line))
        .filter(|fields| seen.insert(fields.clone()))
        .filter(|fields| fields[2] != RTF_REAL_TIME_HEADER)
        .collect();

    let mut events = Vec::with_capacity(rows.len());
    for fields in rows {
        let duration = parse_duration(&fields[3], path)?;
        let real = parse_datetime(
            &format!("{}-{}", stage_log.date_text, fields[2].trim()),
            RTF_DATETIME_FORMAT,
            path,
        )?;
        let elapsed = parse_elapsed(&fields[1], path)?;
        let raw = RawEvent {
            event_label: fields[4].clone(),
            start_time_real: fields[2].clone(),
            duration: Some(duration),
            ..RawEvent::default()
        };
        let mut event = NormalizedEvent::from_raw(
            raw,
            stage_log.reference + TimeDelta::seconds(elapsed),
            elapsed as f64,
        );
        event.start_time_real = Some(resolve_rollover(
            real.time(),
            real.date(),
            stage_log.reference,
        ));
        events.push(event);
    }
    Ok(events.into())
}

/// `H:M:S` durations; anything without a `00:` component has no duration.
fn parse_duration(text: &str, path: &Path) -> Result<f64> {
    if !text.contains("00:") {
        return Ok(0.0);
    }
    NaiveTime::parse_from_str(text.trim(), DURATION_FORMAT)
        .map(|time| f64::from(time.num_seconds_from_midnight()))
        .map_err(|_| IngestError::InvalidValue {
            field: "duration",
            value: text.to_string(),
            path: path.to_path_buf(),
        })
}

fn parse_elapsed(text: &str, path: &Path) -> Result<i64> {
    NaiveTime::parse_from_str(text.trim(), ELAPSED_FORMAT)
        .map(|time| i64::from(time.num_seconds_from_midnight()))
        .map_err(|_| IngestError::InvalidDateTime {
            value: text.to_string(),
            format: ELAPSED_FORMAT,
            path: path.to_path_buf(),
        })
}
