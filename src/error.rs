//! Error types for Markov Ethogram

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or exporting a transition model
#[derive(Debug, Error)]
pub enum EthogramError {
    /// A required column or cell is missing or unreadable in an input file.
    #[error("{}: {}", .file.display(), describe_row(.row, .field))]
    MalformedInputRow {
        file: PathBuf,
        /// 1-based data row, `None` when a whole column is missing
        row: Option<usize>,
        field: String,
    },

    #[error("Mismatched list lengths: {values} values but {colors} colors")]
    MismatchedListLengths { values: usize, colors: usize },

    #[error("Invalid color hex: {0:?} (expected #RRGGBB)")]
    InvalidColor(String),

    #[error("Invalid job configuration: {0}")]
    Config(String),

    #[error("Delimited text error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EthogramError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EthogramError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        EthogramError::Csv {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn missing_column(file: impl Into<PathBuf>, field: &str) -> Self {
        EthogramError::MalformedInputRow {
            file: file.into(),
            row: None,
            field: field.to_string(),
        }
    }

    pub(crate) fn bad_cell(file: impl Into<PathBuf>, row: usize, field: &str) -> Self {
        EthogramError::MalformedInputRow {
            file: file.into(),
            row: Some(row),
            field: field.to_string(),
        }
    }
}

fn describe_row(row: &Option<usize>, field: &str) -> String {
    match row {
        Some(row) => format!("row {row}: missing or invalid value for field `{field}`"),
        None => format!("missing required column `{field}`"),
    }
}
