//! Annotation events as read from source files and after time resolution.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One annotation record exactly as found in a source file.
///
/// The time of day is kept as written; it is ambiguous across midnight until
/// resolved against the recording date.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawEvent {
    /// Vendor label, unmodified.
    pub event_label: String,
    /// Wall-clock time-of-day text.
    pub start_time_real: String,
    /// Duration in seconds when the source carries one.
    pub duration: Option<f64>,
    pub scoring_channel: Option<String>,
    /// Validation flag, only present in CSV exports.
    pub validated: Option<String>,
    /// Remaining source columns, kept for exact-duplicate detection.
    pub details: BTreeMap<String, String>,
}

/// An event with an absolute timestamp and an offset from recording start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub label: String,
    /// Day-disambiguated start timestamp.
    pub start_ts: NaiveDateTime,
    /// Seconds since the start of the recording.
    pub start_sec: f64,
    /// Duration in seconds, 0 when unknown.
    pub duration: f64,
    /// Resolved wall-clock time when it differs from `start_ts`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time_real: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoring_channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

impl NormalizedEvent {
    /// Builds a normalized event from a raw record and its resolved timing.
    pub fn from_raw(raw: RawEvent, start_ts: NaiveDateTime, start_sec: f64) -> Self {
        Self {
            label: raw.event_label,
            start_ts,
            start_sec,
            duration: raw.duration.unwrap_or(0.0),
            start_time_real: None,
            scoring_channel: raw.scoring_channel,
            validated: raw.validated,
            details: raw.details,
        }
    }

    /// Returns true unless the event carries a validation flag other than "Yes".
    pub fn is_validated(&self) -> bool {
        self.validated.as_deref().is_none_or(|flag| flag == "Yes")
    }

    fn row_key(&self) -> RowKey<'_> {
        RowKey {
            label: &self.label,
            start_ts: self.start_ts,
            start_sec: self.start_sec.to_bits(),
            duration: self.duration.to_bits(),
            start_time_real: self.start_time_real,
            scoring_channel: self.scoring_channel.as_deref(),
            validated: self.validated.as_deref(),
            details: &self.details,
        }
    }
}

#[derive(PartialEq, Eq, Hash)]
struct RowKey<'a> {
    label: &'a str,
    start_ts: NaiveDateTime,
    start_sec: u64,
    duration: u64,
    start_time_real: Option<NaiveDateTime>,
    scoring_channel: Option<&'a str>,
    validated: Option<&'a str>,
    details: &'a BTreeMap<String, String>,
}

/// Ordered event table produced by one dialect parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventTable {
    events: Vec<NormalizedEvent>,
}

impl EventTable {
    pub fn new(events: Vec<NormalizedEvent>) -> Self {
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn first(&self) -> Option<&NormalizedEvent> {
        self.events.first()
    }

    pub fn last(&self) -> Option<&NormalizedEvent> {
        self.events.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NormalizedEvent> {
        self.events.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, NormalizedEvent> {
        self.events.iter_mut()
    }

    pub fn push(&mut self, event: NormalizedEvent) {
        self.events.push(event);
    }

    /// Appends another table after this one, keeping both orders.
    pub fn append(&mut self, other: EventTable) {
        self.events.extend(other.events);
    }

    /// Stable sort on `start_sec`.
    pub fn sort_by_offset(&mut self) {
        self.events
            .sort_by(|left, right| left.start_sec.total_cmp(&right.start_sec));
    }

    /// Drops rows identical in every field to an earlier row.
    ///
    /// Returns the number of rows removed.
    pub fn dedup_exact(&mut self) -> usize {
        let keep: Vec<bool> = {
            let mut seen = HashSet::with_capacity(self.events.len());
            self.events
                .iter()
                .map(|event| seen.insert(event.row_key()))
                .collect()
        };
        let before = self.events.len();
        let mut flags = keep.into_iter();
        self.events.retain(|_| flags.next().unwrap_or(true));
        before - self.events.len()
    }

    pub fn into_inner(self) -> Vec<NormalizedEvent> {
        self.events
    }
}

impl From<Vec<NormalizedEvent>> for EventTable {
    fn from(events: Vec<NormalizedEvent>) -> Self {
        Self::new(events)
    }
}

impl IntoIterator for EventTable {
    type Item = NormalizedEvent;
    type IntoIter = std::vec::IntoIter<NormalizedEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a EventTable {
    type Item = &'a NormalizedEvent;
    type IntoIter = std::slice::Iter<'a, NormalizedEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
