//! Record normalization
//!
//! Converts free-text labels to canonical tokens, attaches durations and the
//! grouping scope, and drops observation gaps.

use crate::duration::{effective_timestamps, event_durations, hour_bucket};
use crate::schema::SubjectLog;
use crate::types::{BehaviorRecord, GroupBy, Observation, OUT_OF_VIEW};

/// Canonical token: `"out of view"` → `"OUT_OF_VIEW"`.
pub fn upper_snake(label: &str) -> String {
    label
        .split_whitespace()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Display form of a token: `"OUT_OF_VIEW"` → `"Out of view"`.
///
/// Literal `\uXXXX` escapes left in labels by spreadsheet exports are decoded,
/// so `"DISPLAY_♀"` becomes `"Display ♀"`.
pub fn split_to_spaced(token: &str) -> String {
    let lowered = token.to_lowercase();
    let mut chars = lowered.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    capitalized
        .split('_')
        .map(decode_unicode_escape)
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_unicode_escape(word: &str) -> String {
    let Some(hex) = word
        .strip_prefix("\\u")
        .or_else(|| word.strip_prefix("\\U"))
    else {
        return word.to_string();
    };
    u32::from_str_radix(hex, 16)
        .ok()
        .and_then(char::from_u32)
        .map(String::from)
        .unwrap_or_else(|| word.to_string())
}

/// Whether a canonical token is the observation-gap sentinel
pub fn is_sentinel(token: &str) -> bool {
    token == OUT_OF_VIEW
}

/// Normalizer for subject observation logs
pub struct RecordNormalizer;

impl RecordNormalizer {
    /// Normalize one row. Returns `None` for sentinel rows.
    pub fn normalize(
        row: &Observation,
        timestamp: f64,
        duration: f64,
        group_by: GroupBy,
    ) -> Option<BehaviorRecord> {
        let behavior = upper_snake(&row.behavior);
        if is_sentinel(&behavior) {
            return None;
        }

        let category = row.category.as_deref().map(upper_snake);
        let scope = group_by.scope_for(hour_bucket(timestamp), category.as_deref());

        Some(BehaviorRecord {
            behavior,
            scope,
            duration,
        })
    }

    /// Normalize a whole log, preserving row order.
    ///
    /// Durations are measured on the full sequence before sentinel rows are
    /// dropped, so the event preceding a gap keeps the time until the gap.
    pub fn normalize_log(log: &SubjectLog, group_by: GroupBy) -> Vec<BehaviorRecord> {
        let timestamps = effective_timestamps(log);
        let durations = event_durations(&timestamps, log.clock);

        log.observations
            .iter()
            .zip(timestamps.iter().zip(durations.iter()))
            .filter_map(|(row, (&t, &d))| Self::normalize(row, t, d, group_by))
            .collect()
    }
}
