//! Duration derivation
//!
//! Per-event durations come from consecutive timestamps within one subject's
//! log. Frame-indexed logs carry no usable clock, so every event counts as one
//! unit instead.

use crate::schema::SubjectLog;
use crate::types::EventClock;

/// Seconds per hour bucket
pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Constant timestamp assigned to every event of a frame-indexed log
pub const FRAME_UNIT: f64 = 1.0;

/// 1-indexed hour bucket: `ceil(seconds / 3600)`, with time zero in hour 1.
pub fn hour_bucket(seconds: f64) -> u32 {
    (seconds / SECONDS_PER_HOUR).ceil().max(1.0) as u32
}

/// Effective timestamps of a log, with frame logs coerced to [`FRAME_UNIT`].
///
/// Missing timestamps in an elapsed log are treated as zero; the reader
/// rejects such rows before they get here.
pub fn effective_timestamps(log: &SubjectLog) -> Vec<f64> {
    match log.clock {
        EventClock::Frame => vec![FRAME_UNIT; log.observations.len()],
        EventClock::Elapsed => log
            .observations
            .iter()
            .map(|o| o.time.unwrap_or(0.0))
            .collect(),
    }
}

/// Duration of every event in order.
///
/// Elapsed: `t[i+1] - t[i]`, with the final event coerced from undefined to 0
/// so the behavior table keeps one row per event.
/// Frame: each event contributes exactly one unit.
pub fn event_durations(timestamps: &[f64], clock: EventClock) -> Vec<f64> {
    match clock {
        EventClock::Frame => vec![FRAME_UNIT; timestamps.len()],
        EventClock::Elapsed => {
            let mut durations: Vec<f64> = timestamps
                .windows(2)
                .map(|pair| pair[1] - pair[0])
                .collect();
            if !timestamps.is_empty() {
                durations.push(0.0);
            }
            durations
        }
    }
}
