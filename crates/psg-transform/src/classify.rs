//! Mapping of normalized events onto the AASM stage and event taxonomies.

use std::collections::HashSet;

use tracing::debug;

use psg_model::{
    AasmEvent, AasmEvents, Annotation, AnnotationSet, EventTable, Hypnogram, NormalizedEvent,
    OriginalAnnotations, SleepStage,
};

use crate::mapping::{event_for_label, stage_for_label};

/// Scorer name of the unmodified label stream.
pub const ORIGINAL_SCORER: &str = "original";
/// Scorer name of the classified streams.
pub const MANUAL_SCORER: &str = "manual";

pub fn classify_stage(event: &NormalizedEvent) -> Option<Annotation<SleepStage>> {
    stage_for_label(&event.label).map(|stage| Annotation::from_event(stage, event))
}

/// Maps a clinical event; events with a validation flag other than "Yes" are
/// skipped.
pub fn classify_event(event: &NormalizedEvent) -> Option<Annotation<AasmEvent>> {
    let name = event_for_label(&event.label)?;
    event
        .is_validated()
        .then(|| Annotation::from_event(name, event))
}

/// Builds the original, hypnogram and AASM event streams of one table.
///
/// Every event lands in the original stream. Classified streams keep the
/// first annotation per `(start_sec, label)`.
pub fn classify(table: &EventTable) -> AnnotationSet {
    let mut original = Vec::with_capacity(table.len());
    let mut stages = Vec::new();
    let mut events = Vec::new();
    let mut seen_stages = HashSet::new();
    let mut seen_events = HashSet::new();
    let mut unmapped = 0usize;

    for event in table {
        original.push(Annotation::from_event(event.label.clone(), event));
        let stage = classify_stage(event);
        let aasm = classify_event(event);
        if stage.is_none() && aasm.is_none() {
            unmapped += 1;
        }
        if let Some(stage) = stage
            && seen_stages.insert((stage.start_sec.to_bits(), stage.name))
        {
            stages.push(stage);
        }
        if let Some(aasm) = aasm
            && seen_events.insert((aasm.start_sec.to_bits(), aasm.name))
        {
            events.push(aasm);
        }
    }
    debug!(
        total = original.len(),
        stages = stages.len(),
        events = events.len(),
        unmapped,
        "classified annotations"
    );

    AnnotationSet {
        original: OriginalAnnotations::new(ORIGINAL_SCORER, original),
        hypnogram: Hypnogram::new(MANUAL_SCORER, stages),
        events: AasmEvents::new(MANUAL_SCORER, events),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{AASM_EVENT_MAPPING, STAGE_MAPPING};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn event(label: &str, start_sec: f64, validated: Option<&str>) -> NormalizedEvent {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap();
        NormalizedEvent {
            label: label.to_string(),
            start_ts: start + chrono::TimeDelta::seconds(start_sec as i64),
            start_sec,
            duration: 30.0,
            start_time_real: None,
            scoring_channel: None,
            validated: validated.map(str::to_string),
            details: BTreeMap::new(),
        }
    }

    #[test]
    fn mapped_labels_produce_exactly_one_annotation() {
        let table = EventTable::new(vec![
            event("Veille", 0.0, None),
            event("APNEA-OBSTRUCTIVE", 10.0, None),
            event("Artefact (PRES)", 20.0, None),
        ]);
        let set = classify(&table);
        assert_eq!(set.original.len(), 3);
        assert_eq!(set.original.scorer, "original");
        assert_eq!(set.hypnogram.annotations.len(), 1);
        assert_eq!(set.hypnogram.annotations[0].name, SleepStage::W);
        assert_eq!(set.hypnogram.scorer, "manual");
        assert_eq!(set.events.annotations.len(), 1);
        assert_eq!(set.events.annotations[0].name, AasmEvent::ApneaObstructive);
        assert_eq!(set.original.annotations[2].name, "Artefact (PRES)");
    }

    #[test]
    fn every_stage_label_yields_one_hypnogram_entry() {
        for (label, stage) in STAGE_MAPPING {
            let set = classify(&EventTable::new(vec![event(label, 90.0, None)]));
            assert_eq!(set.original.len(), 1, "{label}");
            assert_eq!(set.hypnogram.len(), 1, "{label}");
            assert_eq!(set.hypnogram.annotations[0].name, *stage, "{label}");
            assert_eq!(set.hypnogram.annotations[0].start_sec, 90.0, "{label}");
            assert!(set.events.is_empty(), "{label}");
        }
    }

    #[test]
    fn every_event_label_yields_one_aasm_event() {
        for (label, aasm) in AASM_EVENT_MAPPING {
            let set = classify(&EventTable::new(vec![event(label, 90.0, Some("Yes"))]));
            assert_eq!(set.original.len(), 1, "{label}");
            assert_eq!(set.events.len(), 1, "{label}");
            assert_eq!(set.events.annotations[0].name, *aasm, "{label}");
            assert!(set.hypnogram.is_empty(), "{label}");
        }
    }

    #[test]
    fn unmapped_label_stays_in_original_stream() {
        let set = classify(&EventTable::new(vec![event("Désaturation", 0.0, Some("Yes"))]));
        assert_eq!(set.original.len(), 1);
        assert_eq!(set.original.annotations[0].name, "Désaturation");
        assert!(set.hypnogram.is_empty());
        assert!(set.events.is_empty());
    }

    #[test]
    fn csv_events_require_yes() {
        assert!(classify_event(&event("Apnée centrale", 0.0, Some("Yes"))).is_some());
        assert!(classify_event(&event("Apnée centrale", 0.0, Some("No"))).is_none());
        assert!(classify_event(&event("Apnée centrale", 0.0, Some(""))).is_none());
        assert!(classify_event(&event("Apnée centrale", 0.0, None)).is_some());
    }

    #[test]
    fn stage_classification_ignores_validation() {
        let stage = classify_stage(&event("Sleep stage N2", 100.0, Some("No"))).unwrap();
        assert_eq!(stage.name, SleepStage::N2);
        assert_eq!(stage.start_sec, 100.0);
    }

    #[test]
    fn duplicates_collapse_on_offset_and_class() {
        let table = EventTable::new(vec![
            event("SLEEP-S3", 60.0, None),
            event("SLEEP-S4", 60.0, None),
            event("AROUSAL", 61.0, None),
            event("Arousal cortical", 61.0, None),
            event("AROUSAL-SPONT", 61.0, None),
        ]);
        let set = classify(&table);
        assert_eq!(set.original.len(), 5);
        assert_eq!(set.hypnogram.len(), 1);
        assert_eq!(set.events.len(), 2);
    }
}
