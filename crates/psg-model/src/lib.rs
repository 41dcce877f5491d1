//! Data model shared by the PSG conversion crates.
//!
//! Events flow from [`RawEvent`] (one source line) to [`NormalizedEvent`]
//! (resolved timestamp and offset) to classified [`Annotation`]s.

pub mod annotation;
pub mod counts;
pub mod error;
pub mod event;
pub mod recording;
pub mod taxonomy;

pub use annotation::{
    AasmEvents, Annotation, AnnotationSet, AnnotationStream, Hypnogram, OriginalAnnotations,
};
pub use counts::{ConversionFailure, ErrorCounts};
pub use error::{ModelError, Result};
pub use event::{EventTable, NormalizedEvent, RawEvent};
pub use recording::{RecordingDevice, RecordingMetadata};
pub use taxonomy::{AasmEvent, SleepStage};

/// Length of one scoring epoch in seconds.
pub const EPOCH_SECONDS: f64 = 30.0;
