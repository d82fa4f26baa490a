//! Markov Ethogram - empirical behavior-transition models from observation logs
//!
//! Reads one delimited observation log per subject and builds a first-order
//! Markov model of behavior sequences through a deterministic pipeline:
//! record normalization → duration calculation → transition extraction →
//! per-subject aggregation → cross-subject merge → probability normalization.
//!
//! ## Outputs
//!
//! - **Tables**: behavior frequency and transition probability tables,
//!   exported as CSV with a stable column order
//! - **Diagrams**: Graphviz DOT chain diagrams, legends and a transition
//!   state table, filtered by an edge visibility threshold

pub mod aggregate;
pub mod color;
pub mod config;
pub mod duration;
pub mod error;
pub mod export;
pub mod normalizer;
pub mod pipeline;
pub mod probability;
pub mod render;
pub mod runner;
pub mod schema;
pub mod transitions;
pub mod types;

pub use color::{resolve_color, Color, ColorTable};
pub use config::{JobConfig, JobFile, LegendPlacement};
pub use error::EthogramError;
pub use pipeline::{ModelBuilder, ModelOptions, TransitionModel};
pub use runner::{run_job, validate_input, JobReport};
pub use types::{DurationMode, GroupBy};

/// Crate version, reported by the CLI
pub const ETHOGRAM_VERSION: &str = env!("CARGO_PKG_VERSION");
