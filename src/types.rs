//! Core types for the Markov Ethogram pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw observations, normalized behavior records, transition records,
//! group keys and the aggregated, probability-weighted rows.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical token marking an observation gap rather than a behavior
pub const OUT_OF_VIEW: &str = "OUT_OF_VIEW";

/// Grouping policy applied to both the behavior and transition tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupBy {
    /// One scope for the whole run
    #[default]
    #[serde(alias = "BASIC")]
    None,
    /// Partition by observation hour
    Time,
    /// Partition by behavioral category
    BehavioralCategory,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::None => "NONE",
            GroupBy::Time => "TIME",
            GroupBy::BehavioralCategory => "BEHAVIORAL_CATEGORY",
        }
    }

    /// Parse a canonical (upper snake) token. `BASIC` is accepted for `None`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "" | "NONE" | "BASIC" => Some(GroupBy::None),
            "TIME" => Some(GroupBy::Time),
            "BEHAVIORAL_CATEGORY" => Some(GroupBy::BehavioralCategory),
            _ => None,
        }
    }

    /// Scope a record falls into under this grouping policy.
    pub fn scope_for(&self, hour: u32, category: Option<&str>) -> Scope {
        match self {
            GroupBy::None => Scope::All,
            GroupBy::Time => Scope::Hour(hour),
            GroupBy::BehavioralCategory => Scope::Category(category.unwrap_or_default().to_string()),
        }
    }

    /// Scope used for the display totals (`ALL_*` columns).
    ///
    /// Only time grouping keeps a per-hour display total; the other policies
    /// report one grand total for the run.
    pub fn display_scope(&self, scope: &Scope) -> Scope {
        match (self, scope) {
            (GroupBy::Time, Scope::Hour(hour)) => Scope::Hour(*hour),
            _ => Scope::All,
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How per-event durations are derived from a subject's log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DurationMode {
    /// Frame-indexed when the file has a `frame` column, elapsed time otherwise
    #[default]
    Auto,
    /// Durations are differences between consecutive `Time` values
    Elapsed,
    /// Every event counts as one unit
    Frame,
}

impl DurationMode {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "" | "AUTO" => Some(DurationMode::Auto),
            "ELAPSED" | "TIME" => Some(DurationMode::Elapsed),
            "FRAME" | "FRAMES" => Some(DurationMode::Frame),
            _ => None,
        }
    }

    /// Resolve the clock for one file given whether it carries a `frame` column.
    pub fn resolve(&self, has_frame_column: bool) -> EventClock {
        match self {
            DurationMode::Auto if has_frame_column => EventClock::Frame,
            DurationMode::Auto | DurationMode::Elapsed => EventClock::Elapsed,
            DurationMode::Frame => EventClock::Frame,
        }
    }
}

/// Effective time base of a single subject log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventClock {
    Elapsed,
    Frame,
}

/// One input row as read from a subject's file, labels still raw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Free-text behavior label
    pub behavior: String,
    /// Free-text behavioral category label, when the column is present
    pub category: Option<String>,
    /// Timestamp in seconds (absent for frame-indexed logs)
    pub time: Option<f64>,
}

/// Grouping scope a record or aggregate row belongs to
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    All,
    Hour(u32),
    Category(String),
}

impl Scope {
    pub fn hour(&self) -> Option<u32> {
        match self {
            Scope::Hour(hour) => Some(*hour),
            _ => None,
        }
    }

    pub fn category(&self) -> Option<&str> {
        match self {
            Scope::Category(category) => Some(category),
            _ => None,
        }
    }
}

/// Normalized, sentinel-free behavior occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorRecord {
    /// Canonical behavior token
    pub behavior: String,
    /// Grouping scope (hour bucket or category, depending on policy)
    pub scope: Scope,
    /// Time until the next event; 0 for the last event of a log
    pub duration: f64,
}

/// One step of a subject's behavior sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub behavior: String,
    pub next_behavior: String,
    /// Scope of the source record
    pub scope: Scope,
    /// Duration of the source record
    pub duration: f64,
}

/// Key of the behavior table
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BehaviorKey {
    pub behavior: String,
    pub scope: Scope,
}

/// Key of the transition table
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransitionKey {
    pub behavior: String,
    pub next_behavior: String,
    pub scope: Scope,
}

/// Running count and summed duration for one group
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Tally {
    pub count: u64,
    pub duration: f64,
}

impl Tally {
    pub fn add(&mut self, duration: f64) {
        self.count += 1;
        self.duration += duration;
    }

    pub fn merge(&mut self, other: &Tally) {
        self.count += other.count;
        self.duration += other.duration;
    }
}

/// Aggregated behavior frequency row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorGroup {
    pub behavior: String,
    pub scope: Scope,
    /// Occurrences across all subjects
    pub count: u64,
    /// Summed duration across all subjects
    pub duration: f64,
    /// Denominator: counts sharing this row's scope
    pub scope_total: u64,
    /// Display total: per hour under time grouping, grand total otherwise
    pub display_total: u64,
    /// `count / scope_total`
    pub probability: f64,
}

/// Aggregated transition probability row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionGroup {
    pub behavior: String,
    pub next_behavior: String,
    pub scope: Scope,
    pub count: u64,
    pub duration: f64,
    /// Denominator: transitions out of the same behavior within the same scope
    pub scope_total: u64,
    /// Display total: per hour under time grouping, grand total otherwise
    pub display_total: u64,
    /// `count / scope_total`
    pub probability: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_tokens() {
        assert_eq!(GroupBy::from_token("BASIC"), Some(GroupBy::None));
        assert_eq!(GroupBy::from_token("TIME"), Some(GroupBy::Time));
        assert_eq!(
            GroupBy::from_token("BEHAVIORAL_CATEGORY"),
            Some(GroupBy::BehavioralCategory)
        );
        assert_eq!(GroupBy::from_token("WEEKDAY"), None);
        assert_eq!(GroupBy::default().as_str(), "NONE");
    }

    #[test]
    fn test_scope_selection() {
        assert_eq!(GroupBy::None.scope_for(2, Some("AGGRESSIVE")), Scope::All);
        assert_eq!(GroupBy::Time.scope_for(2, Some("AGGRESSIVE")), Scope::Hour(2));
        assert_eq!(
            GroupBy::BehavioralCategory.scope_for(2, Some("AGGRESSIVE")),
            Scope::Category("AGGRESSIVE".to_string())
        );
    }

    #[test]
    fn test_display_scope() {
        assert_eq!(GroupBy::Time.display_scope(&Scope::Hour(3)), Scope::Hour(3));
        assert_eq!(
            GroupBy::BehavioralCategory.display_scope(&Scope::Category("X".into())),
            Scope::All
        );
    }

    #[test]
    fn test_duration_mode_resolution() {
        assert_eq!(DurationMode::Auto.resolve(true), EventClock::Frame);
        assert_eq!(DurationMode::Auto.resolve(false), EventClock::Elapsed);
        assert_eq!(DurationMode::Elapsed.resolve(true), EventClock::Elapsed);
        assert_eq!(DurationMode::Frame.resolve(false), EventClock::Frame);
    }

    #[test]
    fn test_hour_scopes_order_numerically() {
        let mut scopes = vec![Scope::Hour(10), Scope::Hour(2), Scope::Hour(1)];
        scopes.sort();
        assert_eq!(scopes, vec![Scope::Hour(1), Scope::Hour(2), Scope::Hour(10)]);
    }
}
