//! Table export
//!
//! Sorts the aggregated tables for presentation and writes them as delimited
//! text with a fixed column order. Exported tables are never filtered by the
//! visibility threshold.

use crate::error::EthogramError;
use crate::pipeline::TransitionModel;
use crate::types::{BehaviorGroup, GroupBy, Scope, TransitionGroup};
use serde::Serialize;
use std::cmp::Ordering;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Scope column name for a grouping policy, `None` when there is no scope column
pub fn scope_column(group_by: GroupBy) -> Option<&'static str> {
    match group_by {
        GroupBy::None => None,
        GroupBy::Time => Some("HOUR_PERFORMED"),
        GroupBy::BehavioralCategory => Some("BEHAVIORAL_CATEGORY"),
    }
}

/// Column order of the behavior table
pub fn behavior_header(group_by: GroupBy) -> Vec<&'static str> {
    let mut header = vec!["BEHAVIOR"];
    header.extend(scope_column(group_by));
    header.push("BEHAVIOR_COUNTS");
    header.push("BEHAVIOR_TOTALS");
    header.push(match group_by {
        GroupBy::Time => "ALL_BEHAVIOR_TOTALS_BY_HOUR",
        _ => "ALL_BEHAVIORS_TOTAL",
    });
    header.push("BEHAVIOR_PROBABILITY");
    header.push("BEHAVIOR_DURATION");
    header
}

/// Column order of the transition table
pub fn transition_header(group_by: GroupBy) -> Vec<&'static str> {
    let mut header = vec!["BEHAVIOR", "BEHAVIOR_NEXT"];
    header.extend(scope_column(group_by));
    header.push("TRANSITION_COUNTS");
    header.push("TRANSITION_TOTALS");
    header.push(match group_by {
        GroupBy::Time => "ALL_TRANSITION_TOTALS_BY_HOUR",
        _ => "ALL_TRANSITIONS_TOTAL",
    });
    header.push("TRANSITION_PROBABILITY");
    header.push("TRANSITION_DURATION");
    header
}

/// Hour first under time grouping so same-hour rows sit together, then
/// behavior, then next behavior.
fn presentation_order(
    group_by: GroupBy,
    a: (&Scope, &str, &str),
    b: (&Scope, &str, &str),
) -> Ordering {
    match group_by {
        GroupBy::Time => (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)),
        _ => (a.1, a.2, a.0).cmp(&(b.1, b.2, b.0)),
    }
}

/// Sort behavior rows for export.
pub fn sort_behaviors(rows: &mut [BehaviorGroup], group_by: GroupBy) {
    rows.sort_by(|a, b| {
        presentation_order(
            group_by,
            (&a.scope, a.behavior.as_str(), ""),
            (&b.scope, b.behavior.as_str(), ""),
        )
    });
}

/// Sort transition rows for export.
pub fn sort_transitions(rows: &mut [TransitionGroup], group_by: GroupBy) {
    rows.sort_by(|a, b| {
        presentation_order(
            group_by,
            (&a.scope, a.behavior.as_str(), a.next_behavior.as_str()),
            (&b.scope, b.behavior.as_str(), b.next_behavior.as_str()),
        )
    });
}

fn scope_cell(scope: &Scope) -> Option<String> {
    match scope {
        Scope::All => None,
        Scope::Hour(hour) => Some(hour.to_string()),
        Scope::Category(category) => Some(category.clone()),
    }
}

/// Write the behavior table (header included) to any writer.
pub fn write_behavior_table<W: Write>(
    writer: W,
    rows: &[BehaviorGroup],
    group_by: GroupBy,
    delimiter: u8,
) -> Result<(), csv::Error> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    out.write_record(behavior_header(group_by))?;

    let mut sorted = rows.to_vec();
    sort_behaviors(&mut sorted, group_by);
    for row in &sorted {
        let mut record = vec![row.behavior.clone()];
        if group_by != GroupBy::None {
            record.extend(scope_cell(&row.scope));
        }
        record.push(row.count.to_string());
        record.push(row.scope_total.to_string());
        record.push(row.display_total.to_string());
        record.push(row.probability.to_string());
        record.push(row.duration.to_string());
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

/// Write the transition table (header included) to any writer.
pub fn write_transition_table<W: Write>(
    writer: W,
    rows: &[TransitionGroup],
    group_by: GroupBy,
    delimiter: u8,
) -> Result<(), csv::Error> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    out.write_record(transition_header(group_by))?;

    let mut sorted = rows.to_vec();
    sort_transitions(&mut sorted, group_by);
    for row in &sorted {
        let mut record = vec![row.behavior.clone(), row.next_behavior.clone()];
        if group_by != GroupBy::None {
            record.extend(scope_cell(&row.scope));
        }
        record.push(row.count.to_string());
        record.push(row.scope_total.to_string());
        record.push(row.display_total.to_string());
        record.push(row.probability.to_string());
        record.push(row.duration.to_string());
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

/// Shared file-name stem: `<subject>_<env>Env`, or `<subject>_BehaviorCategory`
/// under category grouping.
pub fn table_stem(subject: &str, environment: &str, group_by: GroupBy) -> String {
    match group_by {
        GroupBy::BehavioralCategory => format!("{subject}_BehaviorCategory"),
        _ if environment.is_empty() => subject.to_string(),
        _ => format!("{subject}_{environment}Env"),
    }
}

/// Paths of the two exported tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableFiles {
    pub behaviors: PathBuf,
    pub transitions: PathBuf,
}

impl TableFiles {
    pub fn new(dir: &Path, subject: &str, environment: &str, group_by: GroupBy) -> Self {
        let stem = table_stem(subject, environment, group_by);
        Self {
            behaviors: dir.join(format!("{stem}_Behavior_data.csv")),
            transitions: dir.join(format!("{stem}_Transitions_data.csv")),
        }
    }
}

/// Write both tables of a model as CSV into `dir`, creating it as needed.
pub fn export_tables(
    model: &TransitionModel,
    dir: &Path,
    subject: &str,
    environment: &str,
) -> Result<TableFiles, EthogramError> {
    fs::create_dir_all(dir).map_err(|e| EthogramError::io(dir, e))?;
    let files = TableFiles::new(dir, subject, environment, model.group_by);

    let file = fs::File::create(&files.behaviors).map_err(|e| EthogramError::io(&files.behaviors, e))?;
    write_behavior_table(file, &model.behaviors, model.group_by, b',')
        .map_err(|e| EthogramError::csv(&files.behaviors, e))?;

    let file =
        fs::File::create(&files.transitions).map_err(|e| EthogramError::io(&files.transitions, e))?;
    write_transition_table(file, &model.transitions, model.group_by, b',')
        .map_err(|e| EthogramError::csv(&files.transitions, e))?;

    tracing::info!(
        behaviors = %files.behaviors.display(),
        transitions = %files.transitions.display(),
        "exported tables"
    );
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SubjectLog;
    use crate::types::EventClock;
    use pretty_assertions::assert_eq;

    fn model(group_by: GroupBy) -> TransitionModel {
        let mut log = SubjectLog::new("s1", EventClock::Elapsed);
        for (behavior, time) in [("B", 10.0), ("A", 20.0), ("B", 3700.0), ("A", 3710.0)] {
            log.push(behavior, None, time);
        }
        TransitionModel::build(&[log], group_by)
    }

    fn render_behaviors(model: &TransitionModel) -> String {
        let mut buf = Vec::new();
        write_behavior_table(&mut buf, &model.behaviors, model.group_by, b',').unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_headers() {
        assert_eq!(
            behavior_header(GroupBy::None),
            vec![
                "BEHAVIOR",
                "BEHAVIOR_COUNTS",
                "BEHAVIOR_TOTALS",
                "ALL_BEHAVIORS_TOTAL",
                "BEHAVIOR_PROBABILITY",
                "BEHAVIOR_DURATION"
            ]
        );
        assert_eq!(
            transition_header(GroupBy::Time),
            vec![
                "BEHAVIOR",
                "BEHAVIOR_NEXT",
                "HOUR_PERFORMED",
                "TRANSITION_COUNTS",
                "TRANSITION_TOTALS",
                "ALL_TRANSITION_TOTALS_BY_HOUR",
                "TRANSITION_PROBABILITY",
                "TRANSITION_DURATION"
            ]
        );
        assert_eq!(behavior_header(GroupBy::BehavioralCategory)[1], "BEHAVIORAL_CATEGORY");
    }

    #[test]
    fn test_time_rows_sorted_by_hour_first() {
        let csv = render_behaviors(&model(GroupBy::Time));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("A,1,"));
        assert!(lines[2].starts_with("B,1,"));
        assert!(lines[3].starts_with("A,2,"));
        assert!(lines[4].starts_with("B,2,"));
    }

    #[test]
    fn test_none_rows_sorted_by_behavior() {
        let csv = render_behaviors(&model(GroupBy::None));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[1], "A,2,4,4,0.5,3680");
        assert_eq!(lines[2], "B,2,4,4,0.5,20");
    }

    #[test]
    fn test_transition_sorting() {
        let mut rows = model(GroupBy::Time).transitions;
        rows.reverse();
        sort_transitions(&mut rows, GroupBy::Time);
        let keys: Vec<(Option<u32>, &str, &str)> = rows
            .iter()
            .map(|t| (t.scope.hour(), t.behavior.as_str(), t.next_behavior.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (Some(1), "A", "B"),
                (Some(1), "B", "A"),
                (Some(2), "B", "A"),
            ]
        );
    }

    #[test]
    fn test_file_names() {
        let dir = Path::new("out/NONE");
        let files = TableFiles::new(dir, "Betta", "Yellow", GroupBy::None);
        assert_eq!(files.behaviors, dir.join("Betta_YellowEnv_Behavior_data.csv"));
        assert_eq!(files.transitions, dir.join("Betta_YellowEnv_Transitions_data.csv"));
        assert_eq!(
            table_stem("Betta", "Yellow", GroupBy::BehavioralCategory),
            "Betta_BehaviorCategory"
        );
        assert_eq!(table_stem("Betta", "", GroupBy::Time), "Betta");
    }

    #[test]
    fn test_export_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("NONE");
        let files = export_tables(&model(GroupBy::None), &dir, "s", "Blue").unwrap();
        let content = std::fs::read_to_string(&files.transitions).unwrap();
        assert!(content.starts_with("BEHAVIOR,BEHAVIOR_NEXT,TRANSITION_COUNTS"));
    }
}
