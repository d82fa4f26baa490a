//! Pipeline orchestration
//!
//! This module provides the public API for Markov Ethogram.
//! It orchestrates the full pipeline from subject observation logs to the
//! probability-weighted behavior and transition tables.

use crate::aggregate::GroupCounts;
use crate::error::EthogramError;
use crate::probability::ProbabilityNormalizer;
use crate::schema::{import_subject_logs, ReadOptions, SubjectLog};
use crate::types::{BehaviorGroup, DurationMode, GroupBy, TransitionGroup};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options controlling how logs are read and grouped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOptions {
    pub group_by: GroupBy,
    pub duration_mode: DurationMode,
}

impl ModelOptions {
    pub fn new(group_by: GroupBy) -> Self {
        Self {
            group_by,
            ..Default::default()
        }
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            group_by: self.group_by,
            duration_mode: self.duration_mode,
        }
    }
}

/// Empirical first-order Markov model over behavior categories.
///
/// Built once per run and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionModel {
    pub group_by: GroupBy,
    /// Subjects that contributed to the model, in input order
    pub subjects: Vec<String>,
    pub behaviors: Vec<BehaviorGroup>,
    pub transitions: Vec<TransitionGroup>,
}

impl TransitionModel {
    /// Build a model from in-memory subject logs.
    ///
    /// Pipeline stages per subject:
    /// 1. RecordNormalizer - canonical tokens, durations, scope, sentinel removal
    /// 2. extract_transitions - one-step lookahead pairs
    /// 3. GroupCounts - per-subject counts
    ///
    /// then a key-wise merge across subjects and probability normalization.
    pub fn build(logs: &[SubjectLog], group_by: GroupBy) -> Self {
        let mut builder = ModelBuilder::new(group_by);
        for log in logs {
            builder.add_subject(log);
        }
        builder.finish()
    }

    /// Read every CSV/TSV file in `dir` and build a model.
    pub fn from_dir(dir: &Path, options: &ModelOptions) -> Result<Self, EthogramError> {
        let logs = import_subject_logs(dir, &options.read_options())?;
        tracing::info!(
            dir = %dir.display(),
            subjects = logs.len(),
            group_by = %options.group_by,
            "building transition model"
        );
        Ok(Self::build(&logs, options.group_by))
    }

    /// Build from already merged counts.
    pub fn from_counts(counts: &GroupCounts, group_by: GroupBy, subjects: Vec<String>) -> Self {
        Self {
            group_by,
            subjects,
            behaviors: ProbabilityNormalizer::behaviors(counts, group_by),
            transitions: ProbabilityNormalizer::transitions(counts, group_by),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    /// Distinct hour buckets present in the behavior table, ascending
    pub fn hours(&self) -> Vec<u32> {
        let mut hours: Vec<u32> = self.behaviors.iter().filter_map(|b| b.scope.hour()).collect();
        hours.sort_unstable();
        hours.dedup();
        hours
    }
}

/// Incremental builder: feed subjects one at a time, then finish.
pub struct ModelBuilder {
    group_by: GroupBy,
    counts: GroupCounts,
    subjects: Vec<String>,
}

impl ModelBuilder {
    pub fn new(group_by: GroupBy) -> Self {
        Self {
            group_by,
            counts: GroupCounts::default(),
            subjects: Vec::new(),
        }
    }

    /// Count one subject and fold it into the running totals.
    pub fn add_subject(&mut self, log: &SubjectLog) {
        let subject_counts = GroupCounts::from_log(log, self.group_by);
        self.counts.merge(&subject_counts);
        self.subjects.push(log.subject.clone());
    }

    /// Number of subjects added so far
    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }

    pub fn finish(self) -> TransitionModel {
        let model = TransitionModel::from_counts(&self.counts, self.group_by, self.subjects);
        tracing::debug!(
            behavior_groups = model.behaviors.len(),
            transition_groups = model.transitions.len(),
            "transition model ready"
        );
        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventClock, Scope};

    fn subject(name: &str, rows: &[(&str, f64)]) -> SubjectLog {
        let mut log = SubjectLog::new(name, EventClock::Elapsed);
        for (behavior, time) in rows {
            log.push(behavior, None, *time);
        }
        log
    }

    #[test]
    fn test_two_subjects_aba() {
        let logs = vec![
            subject("s1", &[("A", 0.0), ("B", 10.0), ("A", 25.0)]),
            subject("s2", &[("A", 0.0), ("B", 10.0), ("A", 25.0)]),
        ];
        let model = TransitionModel::build(&logs, GroupBy::None);

        assert_eq!(model.subjects, vec!["s1", "s2"]);
        assert_eq!(model.transitions.len(), 2);
        let ab = &model.transitions[0];
        assert_eq!((ab.behavior.as_str(), ab.next_behavior.as_str()), ("A", "B"));
        assert_eq!(ab.count, 2);
        assert_eq!(ab.probability, 1.0);
        let ba = &model.transitions[1];
        assert_eq!(ba.count, 2);
        assert_eq!(ba.probability, 1.0);

        assert_eq!(model.behaviors[0].count, 4);
        assert!((model.behaviors[0].probability - 4.0 / 6.0).abs() < 1e-12);
        assert_eq!(model.behaviors[1].count, 2);
        assert!((model.behaviors[1].probability - 2.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_time_mode_only_observed_hours() {
        let logs = vec![subject(
            "s1",
            &[("A", 100.0), ("B", 200.0), ("A", 3700.0), ("B", 3900.0)],
        )];
        let model = TransitionModel::build(&logs, GroupBy::Time);
        assert_eq!(model.hours(), vec![1, 2]);
        assert!(model.behaviors.iter().all(|b| b.scope.hour().is_some()));
    }

    #[test]
    fn test_builder_matches_build() {
        let logs = vec![
            subject("s1", &[("A", 0.0), ("B", 1.0)]),
            subject("s2", &[("B", 0.0), ("B", 1.0)]),
        ];
        let mut builder = ModelBuilder::new(GroupBy::None);
        for log in logs.iter().rev() {
            builder.add_subject(log);
        }
        assert_eq!(builder.subject_count(), 2);
        let incremental = builder.finish();
        let batch = TransitionModel::build(&logs, GroupBy::None);
        assert_eq!(incremental.behaviors, batch.behaviors);
        assert_eq!(incremental.transitions, batch.transitions);
    }

    #[test]
    fn test_empty_model() {
        let model = TransitionModel::build(&[], GroupBy::None);
        assert!(model.is_empty());
        assert!(model.transitions.is_empty());
        assert!(model.behaviors.iter().all(|b| b.scope == Scope::All));
    }
}
