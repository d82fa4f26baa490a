//! Input schema for observation logs
//!
//! One delimited file per subject, with a `Behavior` column, an optional
//! `Behavioral category` column, and either a `Time` or a `frame` column.

mod reader;
mod subject_log;

pub use reader::*;
pub use subject_log::*;
