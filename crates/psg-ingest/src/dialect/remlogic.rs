//! RemLogic tab separated text exports.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, warn};

use psg_model::{EventTable, NormalizedEvent, RawEvent, RecordingDevice};
use psg_transform::{resolve_rollover, seconds_since};

use super::{AnnotationDialect, TEXT_DATETIME_FORMAT};
use crate::detect::annotation_path;
use crate::error::{IngestError, Result};
use crate::text::{parse_datetime, read_latin1};

/// Stage tokens; rows carrying one are only kept when they span one epoch.
pub const REMLOGIC_STAGE_LABELS: &[&str] = &[
    "SLEEP-S0",
    "SLEEP-S1",
    "SLEEP-S2",
    "SLEEP-S3",
    "SLEEP-S4",
    "SLEEP-REM",
    "SLEEP-UNSCORED",
];

const DATE_LINE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    SleepStage,
    Position,
    StartTime,
    EventLabel,
    Duration,
    ScoringChannel,
}

/// Column layouts found in RemLogic exports, in detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLayout {
    Standard,
    ExtraChannel,
    MissingPosition,
    MissingSleepStage,
    WeirdCase,
}

impl HeaderLayout {
    pub const ALL: [HeaderLayout; 5] = [
        HeaderLayout::Standard,
        HeaderLayout::ExtraChannel,
        HeaderLayout::MissingPosition,
        HeaderLayout::MissingSleepStage,
        HeaderLayout::WeirdCase,
    ];

    /// Header line as exported, without the line terminator.
    pub fn header(&self) -> &'static str {
        match self {
            HeaderLayout::Standard => {
                "Stade de sommeil\tPosition\tHeure [hh:mm:ss]\tEvénement\tDurée[s]"
            }
            HeaderLayout::ExtraChannel => {
                "Stade de sommeil\tPosition\tHeure [hh:mm:ss]\tEvénement\tDurée[s]\tEmplacement"
            }
            HeaderLayout::MissingPosition => {
                "Stade de sommeil\tHeure [hh:mm:ss]\tEvénement\tDurée[s]\tEmplacement"
            }
            HeaderLayout::MissingSleepStage => "Position\tHeure [hh:mm:ss]\tEvénement\tDurée[s]",
            HeaderLayout::WeirdCase => "tPosition\tHeure [hh:mm:ss]\tEvénement\tDurée[s]",
        }
    }

    fn columns(&self) -> &'static [Column] {
        use Column::{Duration, EventLabel, Position, ScoringChannel, SleepStage, StartTime};
        match self {
            HeaderLayout::Standard => &[SleepStage, Position, StartTime, EventLabel, Duration],
            HeaderLayout::ExtraChannel => &[
                SleepStage,
                Position,
                StartTime,
                EventLabel,
                Duration,
                ScoringChannel,
            ],
            HeaderLayout::MissingPosition => {
                &[SleepStage, StartTime, EventLabel, Duration, ScoringChannel]
            }
            HeaderLayout::MissingSleepStage | HeaderLayout::WeirdCase => {
                &[Position, StartTime, EventLabel, Duration]
            }
        }
    }

    /// Finds the first layout whose header appears in `lines`, with the
    /// header's line index.
    pub fn detect(lines: &[&str]) -> Option<(usize, HeaderLayout)> {
        let folded: Vec<String> = lines.iter().map(|line| fold_header(line)).collect();
        HeaderLayout::ALL.into_iter().find_map(|layout| {
            let header = fold_header(layout.header());
            folded
                .iter()
                .position(|line| *line == header)
                .map(|index| (index, layout))
        })
    }
}

/// Header comparison ignores the line terminator and the É/E variation.
fn fold_header(line: &str) -> String {
    line.trim_end_matches(['\r', '\n'])
        .replace('É', "E")
        .replace('é', "e")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RemLogic;

impl RemLogic {
    /// Parses one RemLogic export file.
    pub fn parse_file(&self, path: &Path) -> Result<EventTable> {
        let text = read_latin1(path)?;
        let lines: Vec<&str> = text.lines().collect();
        let date_text = start_date(&lines).ok_or_else(|| IngestError::MissingPreamble {
            path: path.to_path_buf(),
            line: DATE_LINE,
        })?;
        let (header_index, layout) =
            HeaderLayout::detect(&lines).ok_or_else(|| IngestError::UnrecognizedHeader {
                path: path.to_path_buf(),
            })?;
        let columns = layout.columns();

        let mut raws = Vec::new();
        for (index, line) in lines.iter().enumerate().skip(header_index + 1) {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() > columns.len() {
                warn!(
                    file = %path.display(),
                    line = index + 1,
                    expected = columns.len(),
                    found = fields.len(),
                    "skipping RemLogic row with extra fields"
                );
                continue;
            }
            raws.push(raw_event(columns, &fields, path)?);
        }

        let Some(first) = raws.first() else {
            return Err(IngestError::EmptyTable {
                path: path.to_path_buf(),
            });
        };
        let reference = parse_datetime(
            &format!("{date_text}-{}", first.start_time_real),
            TEXT_DATETIME_FORMAT,
            path,
        )?;

        let mut events = Vec::with_capacity(raws.len());
        let mut short_stages = 0usize;
        for raw in raws {
            let naive = parse_datetime(
                &format!("{date_text}-{}", raw.start_time_real),
                TEXT_DATETIME_FORMAT,
                path,
            )?;
            if REMLOGIC_STAGE_LABELS.contains(&raw.event_label.as_str())
                && raw.duration.unwrap_or(0.0) != 30.0
            {
                short_stages += 1;
                continue;
            }
            let start_ts = resolve_rollover(naive.time(), naive.date(), reference);
            events.push(NormalizedEvent::from_raw(
                raw,
                start_ts,
                seconds_since(reference, start_ts),
            ));
        }

        let mut table = EventTable::new(events);
        table.sort_by_offset();
        let duplicates = table.dedup_exact();
        debug!(
            file = %path.display(),
            layout = ?layout,
            events = table.len(),
            short_stages,
            duplicates,
            "parsed RemLogic annotations"
        );
        Ok(table)
    }
}

impl AnnotationDialect for RemLogic {
    fn device(&self) -> RecordingDevice {
        RecordingDevice::RemLogic
    }

    fn parse(&self, dir: &Path, patient: &str, base: &str) -> Result<EventTable> {
        self.parse_file(&annotation_path(dir, patient, base, "txt"))
    }
}

/// `dd/mm/YYYY` from a preamble line such as `Date d'enregistrement: 01/01/2024`.
fn start_date(lines: &[&str]) -> Option<String> {
    lines
        .get(DATE_LINE)?
        .rsplit(':')
        .next()?
        .split_whitespace()
        .next()
        .map(str::to_string)
}

fn raw_event(columns: &[Column], fields: &[&str], path: &Path) -> Result<RawEvent> {
    let mut raw = RawEvent::default();
    let mut details = BTreeMap::new();
    for (column, value) in columns.iter().zip(fields.iter().copied()) {
        match column {
            Column::SleepStage => {
                details.insert("sleep_stage".to_string(), value.to_string());
            }
            Column::Position => {
                details.insert("position".to_string(), value.to_string());
            }
            Column::StartTime => raw.start_time_real = value.trim().to_string(),
            Column::EventLabel => raw.event_label = value.to_string(),
            Column::Duration => raw.duration = parse_duration(value, path)?,
            Column::ScoringChannel => {
                raw.scoring_channel = Some(value.to_string()).filter(|s| !s.is_empty());
            }
        }
    }
    raw.details = details;
    Ok(raw)
}

fn parse_duration(value: &str, path: &Path) -> Result<Option<f64>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|_| IngestError::InvalidValue {
            field: "duration",
            value: value.to_string(),
            path: path.to_path_buf(),
        })
}
