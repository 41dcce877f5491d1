use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::event::NormalizedEvent;
use crate::taxonomy::{AasmEvent, SleepStage};

/// A timed annotation carrying a label of type `T`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation<T> {
    pub name: T,
    pub start_ts: NaiveDateTime,
    pub start_sec: f64,
    pub duration: f64,
}

impl<T> Annotation<T> {
    /// Copies the timing of `event` under a new label.
    pub fn from_event(name: T, event: &NormalizedEvent) -> Self {
        Self {
            name,
            start_ts: event.start_ts,
            start_sec: event.start_sec,
            duration: event.duration,
        }
    }
}

/// An ordered annotation stream attributed to one scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationStream<T> {
    pub scorer: String,
    pub annotations: Vec<Annotation<T>>,
}

impl<T> AnnotationStream<T> {
    pub fn new(scorer: impl Into<String>, annotations: Vec<Annotation<T>>) -> Self {
        Self {
            scorer: scorer.into(),
            annotations,
        }
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}

/// Vendor labels as found in the source file.
pub type OriginalAnnotations = AnnotationStream<String>;
/// Sleep stages mapped to the AASM taxonomy.
pub type Hypnogram = AnnotationStream<SleepStage>;
/// Clinical events mapped to the AASM taxonomy.
pub type AasmEvents = AnnotationStream<AasmEvent>;

/// The three annotation streams kept for each subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSet {
    pub original: OriginalAnnotations,
    pub hypnogram: Hypnogram,
    pub events: AasmEvents,
}
