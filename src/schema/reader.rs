//! Delimited observation-log reader
//!
//! Reads one CSV or TSV file per subject. Column checks happen up front so a
//! malformed file aborts the run before any aggregation starts.

use super::subject_log::{
    SubjectLog, BEHAVIOR_COLUMN, CATEGORY_COLUMN, FRAME_COLUMN, TIME_COLUMN,
};
use crate::error::EthogramError;
use crate::normalizer::{is_sentinel, upper_snake};
use crate::types::{DurationMode, EventClock, GroupBy, Observation};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Options that decide which columns a log must carry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub group_by: GroupBy,
    pub duration_mode: DurationMode,
}

/// Field delimiter implied by a file extension, `None` for unsupported files
pub fn delimiter_for(path: &Path) -> Option<u8> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "csv" => Some(b','),
        "tsv" => Some(b'\t'),
        _ => None,
    }
}

/// List the CSV/TSV files of an input folder, sorted by name.
pub fn list_subject_files(dir: &Path) -> Result<Vec<PathBuf>, EthogramError> {
    let entries = fs::read_dir(dir).map_err(|e| EthogramError::io(dir, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| EthogramError::io(dir, e))?.path();
        if !path.is_file() {
            continue;
        }
        if delimiter_for(&path).is_some() {
            paths.push(path);
        } else {
            tracing::warn!(path = %path.display(), "skipping file that is not CSV or TSV");
        }
    }

    paths.sort();
    Ok(paths)
}

/// Read every subject log in a folder.
pub fn import_subject_logs(
    dir: &Path,
    options: &ReadOptions,
) -> Result<Vec<SubjectLog>, EthogramError> {
    let paths = list_subject_files(dir)?;
    tracing::debug!(dir = %dir.display(), files = paths.len(), "importing subject logs");
    paths
        .iter()
        .map(|path| read_subject_log(path, options))
        .collect()
}

/// Read one subject log from disk.
pub fn read_subject_log(path: &Path, options: &ReadOptions) -> Result<SubjectLog, EthogramError> {
    let delimiter = delimiter_for(path).ok_or_else(|| {
        EthogramError::Config(format!(
            "{} is not a .csv or .tsv file",
            path.display()
        ))
    })?;
    let file = File::open(path).map_err(|e| EthogramError::io(path, e))?;
    read_subject_log_from(file, delimiter, path, options)
}

/// Read one subject log from any reader; `source` names it in errors.
pub fn read_subject_log_from<R: Read>(
    input: R,
    delimiter: u8,
    source: &Path,
    options: &ReadOptions,
) -> Result<SubjectLog, EthogramError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| EthogramError::csv(source, e))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let behavior_idx =
        column(BEHAVIOR_COLUMN).ok_or_else(|| EthogramError::missing_column(source, BEHAVIOR_COLUMN))?;

    let category_idx = column(CATEGORY_COLUMN);
    let category_required = options.group_by == GroupBy::BehavioralCategory;
    if category_required && category_idx.is_none() {
        return Err(EthogramError::missing_column(source, CATEGORY_COLUMN));
    }

    let clock = options.duration_mode.resolve(column(FRAME_COLUMN).is_some());
    let time_idx = match clock {
        EventClock::Elapsed => Some(
            column(TIME_COLUMN).ok_or_else(|| EthogramError::missing_column(source, TIME_COLUMN))?,
        ),
        EventClock::Frame => None,
    };

    let mut observations = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| EthogramError::csv(source, e))?;
        let row = idx + 1;
        let cell = |i: usize| record.get(i).filter(|v| !v.is_empty());

        let behavior = cell(behavior_idx)
            .ok_or_else(|| EthogramError::bad_cell(source, row, BEHAVIOR_COLUMN))?;

        let category = category_idx.and_then(cell);
        if category_required && category.is_none() && !is_sentinel(&upper_snake(behavior)) {
            return Err(EthogramError::bad_cell(source, row, CATEGORY_COLUMN));
        }

        let time = match time_idx {
            Some(i) => Some(
                cell(i)
                    .and_then(parse_timestamp)
                    .ok_or_else(|| EthogramError::bad_cell(source, row, TIME_COLUMN))?,
            ),
            None => None,
        };

        observations.push(Observation {
            behavior: behavior.to_string(),
            category: category.map(str::to_string),
            time,
        });
    }

    let subject = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    tracing::debug!(
        subject = %subject,
        rows = observations.len(),
        clock = ?clock,
        "read subject log"
    );

    Ok(SubjectLog {
        subject,
        source: source.to_path_buf(),
        clock,
        observations,
    })
}

/// Parse a timestamp cell: plain seconds or a clock string.
pub fn parse_timestamp(value: &str) -> Option<f64> {
    if value.contains(':') {
        return hms_to_seconds(value);
    }
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `"H:M:S"`, `"M:S"` or `"S"` to seconds.
pub fn hms_to_seconds(value: &str) -> Option<f64> {
    let parts = value
        .split(':')
        .map(|p| p.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<f64>>>()?;
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }

    Some(
        parts
            .iter()
            .rev()
            .zip([1.0, 60.0, 3600.0])
            .map(|(value, scale)| value * scale)
            .sum(),
    )
}
