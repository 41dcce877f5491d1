//! Re-anchoring of event tables to the EDF recording start.

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use psg_model::EventTable;

use crate::timeline::{seconds_since, shift_seconds};

pub const ANALYSIS_START_LABEL: &str = "ANALYSIS-START";
pub const ANALYSIS_STOP_LABEL: &str = "ANALYSIS-STOP";

/// Labels marking lights off, as exported by the different scoring stations.
pub const LIGHTS_OFF_LABELS: &[&str] = &[
    "Lumières éteintes",
    " LUMIERE ETEINTE",
    " ETEINT LA LUMIERE",
];

/// Labels marking lights on; `Lumières éteintes` counts for both markers.
pub const LIGHTS_ON_LABELS: &[&str] = &[
    "Lumières éteintes",
    " LUMIERE ALLUMEE",
    " ALLUME LA LUMIERE",
    " LUMIERE ALLUMEE 6H01",
];

/// Analysis window and lights markers of one recording.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimelineMarkers {
    pub analysis_start: Option<NaiveDateTime>,
    pub analysis_end: Option<NaiveDateTime>,
    pub lights_off: Option<NaiveDateTime>,
    pub lights_on: Option<NaiveDateTime>,
}

/// Re-anchors `start_sec` of every event to `recording_start`.
///
/// Nothing changes when the first event already starts at the recording
/// start. Offsets are time-of-day deltas, so this is only exact for
/// recordings under 24 hours. Returns whether offsets were rewritten.
pub fn reanchor(table: &mut EventTable, recording_start: NaiveDateTime) -> bool {
    let Some(first) = table.first() else {
        return false;
    };
    if first.start_ts == recording_start {
        return false;
    }
    debug!(
        annotation_start = %first.start_ts,
        recording_start = %recording_start,
        "re-anchoring annotation offsets"
    );
    for event in table.iter_mut() {
        event.start_sec = seconds_since(recording_start, event.start_ts);
    }
    true
}

/// Finds analysis and lights markers; the last matching event wins.
///
/// Without explicit analysis markers the window spans the first event start
/// to the end of the last event, or its start when the end is out of range.
pub fn resolve_markers(table: &EventTable) -> TimelineMarkers {
    let mut markers = TimelineMarkers::default();
    for event in table {
        let label = event.label.as_str();
        if label == ANALYSIS_START_LABEL {
            markers.analysis_start = Some(event.start_ts);
        }
        if label == ANALYSIS_STOP_LABEL {
            markers.analysis_end = Some(event.start_ts);
        }
        if LIGHTS_OFF_LABELS.contains(&label) {
            markers.lights_off = Some(event.start_ts);
        }
        if LIGHTS_ON_LABELS.contains(&label) {
            markers.lights_on = Some(event.start_ts);
        }
    }
    if markers.analysis_start.is_none() {
        markers.analysis_start = table.first().map(|event| event.start_ts);
    }
    if markers.analysis_end.is_none() {
        markers.analysis_end = table.last().map(|event| {
            shift_seconds(event.start_ts, event.duration).unwrap_or_else(|| {
                warn!(
                    label = %event.label,
                    duration = event.duration,
                    "last event duration out of range, analysis ends at its start"
                );
                event.start_ts
            })
        });
    }
    markers
}

/// Re-anchors offsets and resolves markers in one pass over a parsed table.
pub fn reconcile(table: &mut EventTable, recording_start: NaiveDateTime) -> TimelineMarkers {
    reanchor(table, recording_start);
    resolve_markers(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use psg_model::NormalizedEvent;
    use std::collections::BTreeMap;

    fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn event(label: &str, start_ts: NaiveDateTime, start_sec: f64, duration: f64) -> NormalizedEvent {
        NormalizedEvent {
            label: label.to_string(),
            start_ts,
            start_sec,
            duration,
            start_time_real: None,
            scoring_channel: None,
            validated: None,
            details: BTreeMap::new(),
        }
    }

    #[test]
    fn reanchor_uses_recording_start() {
        let mut table = EventTable::new(vec![
            event("SLEEP-S0", at(1, 22, 10, 0), 0.0, 30.0),
            event("SLEEP-S1", at(1, 22, 10, 30), 30.0, 30.0),
            event("SLEEP-S2", at(2, 1, 0, 0), 10_200.0, 30.0),
        ]);
        assert!(reanchor(&mut table, at(1, 22, 0, 0)));
        let offsets: Vec<f64> = table.iter().map(|e| e.start_sec).collect();
        assert_eq!(offsets, vec![600.0, 630.0, 10_800.0]);
    }

    #[test]
    fn reanchor_is_noop_when_aligned() {
        let mut table = EventTable::new(vec![event("W", at(1, 22, 0, 0), 0.0, 30.0)]);
        assert!(!reanchor(&mut table, at(1, 22, 0, 0)));
        assert!(!reanchor(&mut EventTable::default(), at(1, 22, 0, 0)));
    }

    #[test]
    fn events_before_recording_start_wrap_within_a_day() {
        let mut table = EventTable::new(vec![event("x", at(1, 21, 59, 50), 0.0, 0.0)]);
        reanchor(&mut table, at(1, 22, 0, 0));
        assert_eq!(table.first().unwrap().start_sec, 86_390.0);
    }

    #[test]
    fn markers_default_to_event_bounds() {
        let table = EventTable::new(vec![
            event("SLEEP-S0", at(1, 22, 0, 0), 0.0, 30.0),
            event("SLEEP-S2", at(1, 23, 0, 0), 3600.0, 30.0),
        ]);
        let markers = resolve_markers(&table);
        assert_eq!(markers.analysis_start, Some(at(1, 22, 0, 0)));
        assert_eq!(markers.analysis_end, Some(at(1, 23, 0, 30)));
        assert_eq!(markers.lights_off, None);
        assert_eq!(markers.lights_on, None);
    }

    #[test]
    fn explicit_markers_last_match_wins() {
        let table = EventTable::new(vec![
            event("ANALYSIS-START", at(1, 22, 0, 0), 0.0, 0.0),
            event("Lumières éteintes", at(1, 22, 1, 0), 60.0, 0.0),
            event(" LUMIERE ETEINTE", at(1, 22, 2, 0), 120.0, 0.0),
            event("ANALYSIS-START", at(1, 22, 5, 0), 300.0, 0.0),
            event(" LUMIERE ALLUMEE", at(2, 6, 0, 0), 28_800.0, 0.0),
            event("ANALYSIS-STOP", at(2, 6, 1, 0), 28_860.0, 0.0),
            event("SLEEP-S0", at(2, 6, 2, 0), 28_920.0, 30.0),
        ]);
        let markers = resolve_markers(&table);
        assert_eq!(markers.analysis_start, Some(at(1, 22, 5, 0)));
        assert_eq!(markers.analysis_end, Some(at(2, 6, 1, 0)));
        assert_eq!(markers.lights_off, Some(at(1, 22, 2, 0)));
        assert_eq!(markers.lights_on, Some(at(2, 6, 0, 0)));
    }

    #[test]
    fn accented_lights_label_sets_both_markers() {
        let table = EventTable::new(vec![
            event(" LUMIERE ALLUMEE", at(1, 21, 0, 0), 0.0, 0.0),
            event("Lumières éteintes", at(1, 22, 1, 0), 60.0, 0.0),
        ]);
        let markers = resolve_markers(&table);
        assert_eq!(markers.lights_off, Some(at(1, 22, 1, 0)));
        assert_eq!(markers.lights_on, Some(at(1, 22, 1, 0)));
    }

    #[test]
    fn overflowing_last_duration_ends_window_at_event_start() {
        for duration in [1e30, f64::INFINITY] {
            let mut table = EventTable::new(vec![
                event("SLEEP-S0", at(1, 22, 0, 0), 0.0, 30.0),
                event("APNEA", at(1, 23, 0, 0), 3600.0, duration),
            ]);
            let markers = reconcile(&mut table, at(1, 22, 0, 0));
            assert_eq!(markers.analysis_end, Some(at(1, 23, 0, 0)));
        }
    }
}
