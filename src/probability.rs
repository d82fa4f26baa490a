//! Probability normalization
//!
//! Turns merged group counts into probability-weighted rows:
//! - behavior probability = count / total of behaviors sharing the scope
//! - transition probability = count / total of transitions leaving the same
//!   behavior within the same scope
//!
//! Display totals are computed separately from the denominators: per hour
//! under time grouping, one grand total otherwise.

use crate::aggregate::GroupCounts;
use crate::types::{BehaviorGroup, GroupBy, Scope, TransitionGroup};
use std::collections::HashMap;

/// Probability normalizer for merged counts
pub struct ProbabilityNormalizer;

impl ProbabilityNormalizer {
    /// Behavior frequency rows, in key order.
    pub fn behaviors(counts: &GroupCounts, group_by: GroupBy) -> Vec<BehaviorGroup> {
        let mut scope_totals: HashMap<&Scope, u64> = HashMap::new();
        let mut display_totals: HashMap<Scope, u64> = HashMap::new();
        for (key, tally) in &counts.behaviors {
            *scope_totals.entry(&key.scope).or_default() += tally.count;
            *display_totals
                .entry(group_by.display_scope(&key.scope))
                .or_default() += tally.count;
        }

        counts
            .behaviors
            .iter()
            .map(|(key, tally)| {
                let scope_total = scope_totals[&key.scope];
                BehaviorGroup {
                    behavior: key.behavior.clone(),
                    scope: key.scope.clone(),
                    count: tally.count,
                    duration: tally.duration,
                    scope_total,
                    display_total: display_totals[&group_by.display_scope(&key.scope)],
                    probability: ratio(tally.count, scope_total),
                }
            })
            .collect()
    }

    /// Transition probability rows, in key order.
    pub fn transitions(counts: &GroupCounts, group_by: GroupBy) -> Vec<TransitionGroup> {
        let mut source_totals: HashMap<(&str, &Scope), u64> = HashMap::new();
        let mut display_totals: HashMap<Scope, u64> = HashMap::new();
        for (key, tally) in &counts.transitions {
            *source_totals
                .entry((key.behavior.as_str(), &key.scope))
                .or_default() += tally.count;
            *display_totals
                .entry(group_by.display_scope(&key.scope))
                .or_default() += tally.count;
        }

        counts
            .transitions
            .iter()
            .map(|(key, tally)| {
                let scope_total = source_totals[&(key.behavior.as_str(), &key.scope)];
                TransitionGroup {
                    behavior: key.behavior.clone(),
                    next_behavior: key.next_behavior.clone(),
                    scope: key.scope.clone(),
                    count: tally.count,
                    duration: tally.duration,
                    scope_total,
                    display_total: display_totals[&group_by.display_scope(&key.scope)],
                    probability: ratio(tally.count, scope_total),
                }
            })
            .collect()
    }
}

/// `count / total`; a group's total always covers its own count, so the zero
/// branch only guards empty inputs.
fn ratio(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}
