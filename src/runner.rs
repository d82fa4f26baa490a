//! Job execution
//!
//! One job: build the model from the input folder, export both tables, then
//! write the diagrams, their legends and the transition state table into
//! `<output>/<GROUP_BY>/`. A malformed input file fails the job before
//! anything is written.

use crate::config::{JobConfig, LegendPlacement};
use crate::error::EthogramError;
use crate::export::{export_tables, table_stem, TableFiles};
use crate::pipeline::TransitionModel;
use crate::render::{diagram_file_stem, standalone_legend, to_dot, RenderRequest, TransitionTable};
use crate::schema::{list_subject_files, read_subject_log, ReadOptions};
use crate::types::GroupBy;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// What a finished job produced
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub subject: String,
    pub group_by: GroupBy,
    /// Subject logs that contributed, in read order
    pub subjects: Vec<String>,
    pub behavior_groups: usize,
    pub transition_groups: usize,
    pub tables: TableFiles,
    pub diagrams: Vec<PathBuf>,
    pub legends: Vec<PathBuf>,
    pub transition_table: PathBuf,
}

/// Run one job end to end.
pub fn run_job(job: &JobConfig) -> Result<JobReport, EthogramError> {
    let run_id = Uuid::new_v4();
    tracing::info!(
        %run_id,
        input = %job.input_folder.display(),
        group_by = %job.group_by,
        "starting job"
    );

    let model = TransitionModel::from_dir(&job.input_folder, &job.model_options())?;
    write_job_outputs(job, &model, run_id)
}

/// Write every artifact of a job for an already built model.
pub fn write_job_outputs(
    job: &JobConfig,
    model: &TransitionModel,
    run_id: Uuid,
) -> Result<JobReport, EthogramError> {
    let colors = job.color_table(model)?;
    let dir = job.output_dir();

    let tables = export_tables(model, &dir, &job.subject, &job.environment)?;

    let request = RenderRequest::new(job, model, &colors);
    let mut diagrams = Vec::new();
    let mut legends = Vec::new();
    for diagram in request.diagrams() {
        let stem = diagram_file_stem(&job.subject, &job.environment, diagram.hour);
        let embed = job.attach_legend == LegendPlacement::Embedded;

        let path = dir.join(format!("{stem}.dot"));
        write_text(&path, &to_dot(&diagram, embed))?;
        diagrams.push(path);

        if job.attach_legend == LegendPlacement::Separate {
            let legend_dir = dir.join("Legends");
            fs::create_dir_all(&legend_dir).map_err(|e| EthogramError::io(&legend_dir, e))?;
            let path = legend_dir.join(format!("{stem}_Legend.dot"));
            write_text(
                &path,
                &standalone_legend(&diagram.legend, diagram.shows_category()),
            )?;
            legends.push(path);
        }
    }

    let table = TransitionTable::from_model(model, job.edge_visibility_threshold);
    // Named after the environment even under category grouping
    let table_name = table_stem(&job.subject, &job.environment, GroupBy::None);
    let transition_table = dir.join(format!("{table_name}_Transition_Table.dot"));
    write_text(&transition_table, &table.to_dot())?;

    tracing::info!(
        %run_id,
        subjects = model.subjects.len(),
        diagrams = diagrams.len(),
        legends = legends.len(),
        output = %dir.display(),
        "job finished"
    );

    Ok(JobReport {
        run_id,
        generated_at: Utc::now(),
        subject: job.subject.clone(),
        group_by: job.group_by,
        subjects: model.subjects.clone(),
        behavior_groups: model.behaviors.len(),
        transition_groups: model.transitions.len(),
        tables,
        diagrams,
        legends,
        transition_table,
    })
}

fn write_text(path: &Path, text: &str) -> Result<(), EthogramError> {
    fs::write(path, text).map_err(|e| EthogramError::io(path, e))?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "wrote file");
    Ok(())
}

/// Result of checking one input file
#[derive(Debug, Clone, Serialize)]
pub struct FileCheck {
    pub file: PathBuf,
    pub rows: usize,
    pub error: Option<String>,
}

/// Per-file readability report for an input folder
#[derive(Debug, Clone, Serialize)]
pub struct InputReport {
    pub total_files: usize,
    pub valid_files: usize,
    pub invalid_files: usize,
    pub files: Vec<FileCheck>,
}

/// Read every input file and record which ones fail, without stopping at
/// the first failure.
pub fn validate_input(dir: &Path, options: &ReadOptions) -> Result<InputReport, EthogramError> {
    let files: Vec<FileCheck> = list_subject_files(dir)?
        .into_iter()
        .map(|file| match read_subject_log(&file, options) {
            Ok(log) => FileCheck {
                file,
                rows: log.len(),
                error: None,
            },
            Err(e) => FileCheck {
                file,
                rows: 0,
                error: Some(e.to_string()),
            },
        })
        .collect();

    let invalid_files = files.iter().filter(|f| f.error.is_some()).count();
    Ok(InputReport {
        total_files: files.len(),
        valid_files: files.len() - invalid_files,
        invalid_files,
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DurationMode;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_validate_input_reports_each_file() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.csv", "Behavior,Time\nBite,0\nChase,5\n");
        write(tmp.path(), "b.csv", "Action,Time\nBite,0\n");
        write(tmp.path(), "notes.txt", "ignored");

        let report = validate_input(
            tmp.path(),
            &ReadOptions {
                group_by: GroupBy::None,
                duration_mode: DurationMode::Auto,
            },
        )
        .unwrap();

        assert_eq!(report.total_files, 2);
        assert_eq!(report.valid_files, 1);
        assert_eq!(report.files[0].rows, 2);
        let error = report.files[1].error.as_deref().unwrap();
        assert!(error.contains("b.csv"));
        assert!(error.contains("Behavior"));
    }

    #[test]
    fn test_run_job_writes_outputs() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write(input.path(), "fish1.csv", "Behavior,Time\nBite,0\nChase,10\nBite,25\n");

        let mut job = JobConfig::new(input.path(), output.path());
        job.subject = "Betta".to_string();
        job.environment = "Blue".to_string();
        job.attach_legend = LegendPlacement::Separate;

        let report = run_job(&job).unwrap();
        let dir = output.path().join("NONE");
        assert_eq!(report.subjects, vec!["fish1"]);
        assert_eq!(report.tables.behaviors, dir.join("Betta_BlueEnv_Behavior_data.csv"));
        assert_eq!(report.diagrams, vec![dir.join("BettaBehaviorBlueChainModel.dot")]);
        assert_eq!(
            report.legends,
            vec![dir.join("Legends").join("BettaBehaviorBlueChainModel_Legend.dot")]
        );
        assert_eq!(
            report.transition_table,
            dir.join("Betta_BlueEnv_Transition_Table.dot")
        );
        assert!(report.diagrams.iter().all(|p| p.exists()));
        assert!(report.transition_table.exists());
    }
}
