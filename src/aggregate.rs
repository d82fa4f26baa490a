//! Two-phase aggregation
//!
//! Phase 1 counts one subject's behavior and transition records per group key.
//! Phase 2 merges the per-subject maps by key-wise summation. Summation is
//! commutative, so subject order never changes the merged counts. A key only
//! exists once some subject contributes a record to it; absence and zero are
//! the same thing.

use crate::normalizer::RecordNormalizer;
use crate::schema::SubjectLog;
use crate::transitions::extract_transitions;
use crate::types::{
    BehaviorKey, BehaviorRecord, GroupBy, Tally, TransitionKey, TransitionRecord,
};
use std::collections::BTreeMap;

/// Group counts for the behavior and transition tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupCounts {
    pub behaviors: BTreeMap<BehaviorKey, Tally>,
    pub transitions: BTreeMap<TransitionKey, Tally>,
}

impl GroupCounts {
    /// Phase 1: count one subject's records.
    pub fn from_records(records: &[BehaviorRecord], transitions: &[TransitionRecord]) -> Self {
        let mut counts = GroupCounts::default();

        for record in records {
            let key = BehaviorKey {
                behavior: record.behavior.clone(),
                scope: record.scope.clone(),
            };
            counts.behaviors.entry(key).or_default().add(record.duration);
        }

        for transition in transitions {
            let key = TransitionKey {
                behavior: transition.behavior.clone(),
                next_behavior: transition.next_behavior.clone(),
                scope: transition.scope.clone(),
            };
            counts
                .transitions
                .entry(key)
                .or_default()
                .add(transition.duration);
        }

        counts
    }

    /// Phase 1 from a raw subject log: normalize, extract transitions, count.
    ///
    /// A log without any non-sentinel rows yields empty counts.
    pub fn from_log(log: &SubjectLog, group_by: GroupBy) -> Self {
        let records = RecordNormalizer::normalize_log(log, group_by);
        let transitions = extract_transitions(&records);
        let counts = Self::from_records(&records, &transitions);

        tracing::debug!(
            subject = %log.subject,
            records = records.len(),
            transitions = transitions.len(),
            behavior_groups = counts.behaviors.len(),
            transition_groups = counts.transitions.len(),
            "counted subject"
        );

        counts
    }

    /// Phase 2 step: add another subject's counts key by key.
    pub fn merge(&mut self, other: &GroupCounts) {
        for (key, tally) in &other.behaviors {
            self.behaviors.entry(key.clone()).or_default().merge(tally);
        }
        for (key, tally) in &other.transitions {
            self.transitions.entry(key.clone()).or_default().merge(tally);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty() && self.transitions.is_empty()
    }

    /// Total behavior occurrences
    pub fn behavior_count(&self) -> u64 {
        self.behaviors.values().map(|t| t.count).sum()
    }

    /// Total transitions
    pub fn transition_count(&self) -> u64 {
        self.transitions.values().map(|t| t.count).sum()
    }
}

/// Phase 2: fold per-subject counts into global counts.
pub fn merge_all<I>(subjects: I) -> GroupCounts
where
    I: IntoIterator<Item = GroupCounts>,
{
    subjects
        .into_iter()
        .fold(GroupCounts::default(), |mut acc, counts| {
            acc.merge(&counts);
            acc
        })
}
