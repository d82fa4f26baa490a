//! Ethogram CLI - Command-line interface for Markov Ethogram
//!
//! Commands:
//! - run: Execute the jobs of a JSON job file
//! - aggregate: Build one model from a folder and print its tables
//! - validate: Check every input file of a folder for required columns

use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use markov_ethogram::config::DEFAULT_EDGE_VISIBILITY_THRESHOLD;
use markov_ethogram::export::{write_behavior_table, write_transition_table};
use markov_ethogram::runner::write_job_outputs;
use markov_ethogram::schema::ReadOptions;
use markov_ethogram::{
    run_job, validate_input, DurationMode, EthogramError, GroupBy, JobConfig, JobFile,
    TransitionModel, ETHOGRAM_VERSION,
};

/// Ethogram - Behavior transition models from observation logs
#[derive(Parser)]
#[command(name = "ethogram")]
#[command(version = ETHOGRAM_VERSION)]
#[command(about = "Build Markov chain models of behavior from observation logs", long_about = None)]
struct Cli {
    /// Log debug output (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute the jobs of a job file
    Run {
        /// JSON job file
        #[arg(short, long)]
        config: PathBuf,

        /// Run only the job at this index
        #[arg(long)]
        job: Option<usize>,
    },

    /// Build one model from a folder and print both tables
    Aggregate {
        /// Folder of per-subject CSV/TSV logs
        #[arg(short, long)]
        input: PathBuf,

        /// Also write tables, diagrams and the transition table here
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "none")]
        group_by: GroupByArg,

        /// Minimum transition probability for drawn edges
        #[arg(long, default_value_t = DEFAULT_EDGE_VISIBILITY_THRESHOLD)]
        threshold: f64,

        /// Subject label for titles and file names
        #[arg(long, default_value = "Subject")]
        subject: String,

        /// Environment label
        #[arg(long, default_value = "")]
        environment: String,

        #[arg(long, value_enum, default_value = "auto")]
        duration_mode: DurationModeArg,

        /// Output format for stdout
        #[arg(long, value_enum, default_value = "csv")]
        format: OutputFormat,
    },

    /// Check input files for required columns and readable cells
    Validate {
        /// Folder of per-subject CSV/TSV logs
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long, value_enum, default_value = "none")]
        group_by: GroupByArg,

        #[arg(long, value_enum, default_value = "auto")]
        duration_mode: DurationModeArg,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GroupByArg {
    None,
    Time,
    BehavioralCategory,
}

impl From<GroupByArg> for GroupBy {
    fn from(arg: GroupByArg) -> Self {
        match arg {
            GroupByArg::None => GroupBy::None,
            GroupByArg::Time => GroupBy::Time,
            GroupByArg::BehavioralCategory => GroupBy::BehavioralCategory,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DurationModeArg {
    /// Frame-indexed when a `frame` column exists
    Auto,
    Elapsed,
    Frame,
}

impl From<DurationModeArg> for DurationMode {
    fn from(arg: DurationModeArg) -> Self {
        match arg {
            DurationModeArg::Auto => DurationMode::Auto,
            DurationModeArg::Elapsed => DurationMode::Elapsed,
            DurationModeArg::Frame => DurationMode::Frame,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Both tables as CSV, separated by a blank line
    Csv,
    /// The whole model as pretty-printed JSON
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .try_init();
}

fn run(cli: Cli) -> Result<(), EthogramCliError> {
    match cli.command {
        Commands::Run { config, job } => cmd_run(&config, job),

        Commands::Aggregate {
            input,
            output,
            group_by,
            threshold,
            subject,
            environment,
            duration_mode,
            format,
        } => {
            let mut job = JobConfig::new(&input, output.clone().unwrap_or_default());
            job.subject = subject;
            job.environment = environment;
            job.group_by = group_by.into();
            job.duration_mode = duration_mode.into();
            job.edge_visibility_threshold = threshold;
            cmd_aggregate(&job, output.is_some(), format)
        }

        Commands::Validate {
            input,
            group_by,
            duration_mode,
            json,
        } => cmd_validate(
            &input,
            ReadOptions {
                group_by: group_by.into(),
                duration_mode: duration_mode.into(),
            },
            json,
        ),
    }
}

fn cmd_run(config: &Path, index: Option<usize>) -> Result<(), EthogramCliError> {
    let file = JobFile::load(config)?;
    if file.jobs.is_empty() {
        return Err(EthogramCliError::NoJobs);
    }

    let jobs: Vec<&JobConfig> = match index {
        Some(i) => vec![file.jobs.get(i).ok_or(EthogramCliError::NoSuchJob {
            index: i,
            count: file.jobs.len(),
        })?],
        None => file.jobs.iter().collect(),
    };

    let mut reports = Vec::with_capacity(jobs.len());
    for job in jobs {
        reports.push(run_job(job)?);
    }

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

fn cmd_aggregate(
    job: &JobConfig,
    write_files: bool,
    format: OutputFormat,
) -> Result<(), EthogramCliError> {
    if !(0.0..=1.0).contains(&job.edge_visibility_threshold) {
        return Err(EthogramCliError::Ethogram(EthogramError::Config(format!(
            "threshold must be within [0, 1], got {}",
            job.edge_visibility_threshold
        ))));
    }

    let model = TransitionModel::from_dir(&job.input_folder, &job.model_options())?;
    if model.is_empty() {
        return Err(EthogramCliError::EmptyModel);
    }

    if write_files {
        let report = write_job_outputs(job, &model, uuid::Uuid::new_v4())?;
        tracing::info!(
            output = %job.output_dir().display(),
            diagrams = report.diagrams.len(),
            "wrote job outputs"
        );
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Csv => {
            write_behavior_table(&mut out, &model.behaviors, model.group_by, b',')?;
            writeln!(out)?;
            write_transition_table(&mut out, &model.transitions, model.group_by, b',')?;
        }
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(&model)?)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn cmd_validate(input: &Path, options: ReadOptions, json: bool) -> Result<(), EthogramCliError> {
    let report = validate_input(input, &options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total files:   {}", report.total_files);
        println!("Valid files:   {}", report.valid_files);
        println!("Invalid files: {}", report.invalid_files);

        let failures: Vec<_> = report.files.iter().filter(|f| f.error.is_some()).collect();
        if !failures.is_empty() {
            println!("\nErrors:");
            for check in failures {
                println!("  - {}", check.error.as_deref().unwrap_or_default());
            }
        }
    }

    if report.invalid_files > 0 {
        Err(EthogramCliError::ValidationFailed(report.invalid_files))
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum EthogramCliError {
    Io(io::Error),
    Ethogram(EthogramError),
    Json(serde_json::Error),
    Csv(csv::Error),
    NoJobs,
    NoSuchJob { index: usize, count: usize },
    EmptyModel,
    ValidationFailed(usize),
}

impl From<io::Error> for EthogramCliError {
    fn from(e: io::Error) -> Self {
        EthogramCliError::Io(e)
    }
}

impl From<EthogramError> for EthogramCliError {
    fn from(e: EthogramError) -> Self {
        EthogramCliError::Ethogram(e)
    }
}

impl From<serde_json::Error> for EthogramCliError {
    fn from(e: serde_json::Error) -> Self {
        EthogramCliError::Json(e)
    }
}

impl From<csv::Error> for EthogramCliError {
    fn from(e: csv::Error) -> Self {
        EthogramCliError::Csv(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<EthogramCliError> for CliError {
    fn from(e: EthogramCliError) -> Self {
        match e {
            EthogramCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            EthogramCliError::Ethogram(e) => {
                let (code, hint) = match &e {
                    EthogramError::MalformedInputRow { .. } => (
                        "MALFORMED_INPUT",
                        "Run 'ethogram validate' to check every input file",
                    ),
                    EthogramError::MismatchedListLengths { .. } => (
                        "COLOR_ASSIGNMENT",
                        "Check CATEGORY_GRADIENTS and the category colors",
                    ),
                    EthogramError::InvalidColor(_) => {
                        ("INVALID_COLOR", "Colors must be written as #RRGGBB")
                    }
                    EthogramError::Config(_) => {
                        ("CONFIG_ERROR", "Check the job file fields and global fallbacks")
                    }
                    EthogramError::Csv { .. } => ("CSV_ERROR", "Check the delimiter and quoting"),
                    EthogramError::Json(_) => ("JSON_ERROR", "Check JSON syntax"),
                    EthogramError::Io { .. } => ("IO_ERROR", "Check file paths and permissions"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            EthogramCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            EthogramCliError::Csv(e) => CliError {
                code: "CSV_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            EthogramCliError::NoJobs => CliError {
                code: "NO_JOBS".to_string(),
                message: "Job file contains no jobs".to_string(),
                hint: Some("Add at least one entry to JOBS".to_string()),
            },
            EthogramCliError::NoSuchJob { index, count } => CliError {
                code: "NO_SUCH_JOB".to_string(),
                message: format!("Job index {} out of range ({} jobs)", index, count),
                hint: Some("Job indices start at 0".to_string()),
            },
            EthogramCliError::EmptyModel => CliError {
                code: "EMPTY_MODEL".to_string(),
                message: "No behaviors found in input".to_string(),
                hint: Some("Ensure the folder holds CSV or TSV logs with a Behavior column".to_string()),
            },
            EthogramCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} files failed validation", count),
                hint: Some("Fix the listed files and retry".to_string()),
            },
        }
    }
}
