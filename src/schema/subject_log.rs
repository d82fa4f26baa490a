//! Per-subject observation log

use crate::types::{EventClock, Observation};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Behavior label column
pub const BEHAVIOR_COLUMN: &str = "Behavior";

/// Behavioral category column (required only for category grouping)
pub const CATEGORY_COLUMN: &str = "Behavioral category";

/// Timestamp column, in seconds or `H:M:S`
pub const TIME_COLUMN: &str = "Time";

/// Presence of this column marks a frame-indexed log
pub const FRAME_COLUMN: &str = "frame";

/// All observations of one subject, in file order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectLog {
    /// Subject identifier (file stem)
    pub subject: String,
    /// File the log was read from
    pub source: PathBuf,
    /// Effective time base for duration derivation
    pub clock: EventClock,
    /// Rows in file order
    pub observations: Vec<Observation>,
}

impl SubjectLog {
    pub fn new(subject: impl Into<String>, clock: EventClock) -> Self {
        let subject = subject.into();
        Self {
            source: PathBuf::from(&subject),
            subject,
            clock,
            observations: Vec::new(),
        }
    }

    /// Append an elapsed-time observation
    pub fn push(&mut self, behavior: &str, category: Option<&str>, time: f64) {
        self.observations.push(Observation {
            behavior: behavior.to_string(),
            category: category.map(str::to_string),
            time: Some(time),
        });
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}
