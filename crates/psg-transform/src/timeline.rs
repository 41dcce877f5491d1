//! Pure time arithmetic shared by the dialect parsers and the reconciler.
//!
//! Annotation exports only carry times of day. Every resolution here assumes
//! a recording shorter than 24 hours: at most one midnight rollover, and
//! deltas are taken modulo one day.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use psg_model::EPOCH_SECONDS;

const SECONDS_PER_DAY: i64 = 86_400;

/// Places `time_of_day` on `date`, moving it to the next day when it would
/// fall before `reference`.
pub fn resolve_rollover(
    time_of_day: NaiveTime,
    date: NaiveDate,
    reference: NaiveDateTime,
) -> NaiveDateTime {
    let same_day = date.and_time(time_of_day);
    if same_day < reference {
        same_day + TimeDelta::days(1)
    } else {
        same_day
    }
}

/// Whole seconds of `delta` within one day, in `0..86400`.
///
/// Negative deltas wrap: ten seconds before midnight is 86390.
pub fn day_seconds(delta: TimeDelta) -> i64 {
    let mut seconds = delta.num_seconds();
    if delta.subsec_nanos() < 0 {
        seconds -= 1;
    }
    seconds.rem_euclid(SECONDS_PER_DAY)
}

/// Seconds from `origin` to `at`, modulo one day.
pub fn seconds_since(origin: NaiveDateTime, at: NaiveDateTime) -> f64 {
    day_seconds(at - origin) as f64
}

/// Durations of consecutive scoring marks: the gap to the next mark, and one
/// epoch for the last one.
pub fn gap_durations(times: &[NaiveDateTime]) -> Vec<f64> {
    let mut durations: Vec<f64> = times
        .windows(2)
        .map(|pair| day_seconds(pair[1] - pair[0]) as f64)
        .collect();
    if !times.is_empty() {
        durations.push(EPOCH_SECONDS);
    }
    durations
}

/// Caps durations at one scoring epoch.
///
/// A longer gap between stage marks means the recording was interrupted, not
/// that the stage lasted longer.
pub fn clamp_epoch_durations(durations: &[f64]) -> Vec<f64> {
    durations.iter().map(|d| d.min(EPOCH_SECONDS)).collect()
}

/// Rebuilds offsets as the running sum of durations, starting at zero.
///
/// Used when wall-clock times are unreliable because the recording has
/// discontinuities.
pub fn cumulative_offsets(durations: &[f64]) -> Vec<f64> {
    durations
        .iter()
        .scan(0.0, |running, duration| {
            let offset = *running;
            *running += duration;
            Some(offset)
        })
        .collect()
}

/// Converts a number of seconds to a delta, keeping millisecond precision.
///
/// Saturates at the delta range; use [`shift_seconds`] to move a timestamp.
pub fn seconds_delta(seconds: f64) -> TimeDelta {
    let millis = (seconds * 1000.0).round() as i64;
    TimeDelta::try_milliseconds(millis).unwrap_or(if seconds < 0.0 {
        TimeDelta::MIN
    } else {
        TimeDelta::MAX
    })
}

/// `at` moved by `seconds`, or `None` when `seconds` is not finite or the
/// result leaves the calendar range.
pub fn shift_seconds(at: NaiveDateTime, seconds: f64) -> Option<NaiveDateTime> {
    if !seconds.is_finite() {
        return None;
    }
    let delta = TimeDelta::try_milliseconds((seconds * 1000.0).round() as i64)?;
    at.checked_add_signed(delta)
}
