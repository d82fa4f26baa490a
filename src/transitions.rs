//! Transition extraction
//!
//! Pairs every record with the record that follows it (one-step lookahead).
//! The transition inherits the source record's scope and duration: category
//! and hour attribution follow the state being left, not the one entered.

use crate::types::{BehaviorRecord, TransitionRecord};

/// Build `(behavior, next_behavior)` pairs for one subject.
///
/// The last record has no successor and yields no transition; it still
/// counts in the behavior table.
pub fn extract_transitions(records: &[BehaviorRecord]) -> Vec<TransitionRecord> {
    records
        .windows(2)
        .map(|pair| TransitionRecord {
            behavior: pair[0].behavior.clone(),
            next_behavior: pair[1].behavior.clone(),
            scope: pair[0].scope.clone(),
            duration: pair[0].duration,
        })
        .collect()
}
