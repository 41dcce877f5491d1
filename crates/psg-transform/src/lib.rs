//! Timeline reconciliation and classification of parsed annotation tables.
//!
//! - [`timeline`]: rollover resolution, day-wrapped deltas, epoch clamping
//!   and the cumulative ("fake") timeline
//! - [`reconcile`]: re-anchoring to the EDF recording start and marker lookup
//! - [`classify`]: AASM stage and event streams from the [`mapping`] tables

pub mod classify;
pub mod mapping;
pub mod reconcile;
pub mod timeline;

pub use classify::{MANUAL_SCORER, ORIGINAL_SCORER, classify, classify_event, classify_stage};
pub use mapping::{AASM_EVENT_MAPPING, STAGE_MAPPING, event_for_label, stage_for_label};
pub use reconcile::{TimelineMarkers, reanchor, reconcile, resolve_markers};
pub use timeline::{
    clamp_epoch_durations, cumulative_offsets, day_seconds, gap_durations, resolve_rollover,
    seconds_delta, seconds_since, shift_seconds,
};
