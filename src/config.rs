//! Job configuration
//!
//! A job file is JSON with a `JOBS` array and optional `GLOBAL_*` fallbacks.
//! Keys are case-insensitive; color-map keys and enum values are canonicalized
//! the same way behavior labels are.

use crate::color::{assign_colors, make_color_gradient, Color, ColorTable};
use crate::error::EthogramError;
use crate::normalizer::upper_snake;
use crate::pipeline::{ModelOptions, TransitionModel};
use crate::types::{DurationMode, GroupBy};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default minimum transition probability for a drawn edge
pub const DEFAULT_EDGE_VISIBILITY_THRESHOLD: f64 = 0.05;

/// Where a diagram's legend goes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendPlacement {
    /// Drawn inside the diagram
    Embedded,
    /// Written to a separate legend file
    Separate,
    /// No legend
    #[default]
    Omitted,
}

impl LegendPlacement {
    /// `true` embeds, `false` writes a separate file, absent omits.
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => LegendPlacement::Embedded,
            Some(false) => LegendPlacement::Separate,
            None => LegendPlacement::Omitted,
        }
    }
}

/// One fully resolved job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobConfig {
    pub input_folder: PathBuf,
    pub output_folder: PathBuf,
    /// Subject label used in titles and file names
    pub subject: String,
    /// Environment label; also selects the `ENV_<ENVIRONMENT>` background
    pub environment: String,
    /// Canonical token → color
    pub color_map: BTreeMap<String, Color>,
    pub group_by: GroupBy,
    /// Minimum transition probability for an edge to be drawn, in [0, 1]
    pub edge_visibility_threshold: f64,
    pub attach_legend: LegendPlacement,
    pub duration_mode: DurationMode,
    /// Shade behaviors within a category from the category's base color
    pub category_gradients: bool,
}

impl JobConfig {
    /// Job with built-in defaults for everything but the folders.
    pub fn new(input_folder: impl Into<PathBuf>, output_folder: impl Into<PathBuf>) -> Self {
        let input_folder = input_folder.into();
        let subject = input_folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Subject".to_string());
        Self {
            input_folder,
            output_folder: output_folder.into(),
            subject,
            environment: String::new(),
            color_map: BTreeMap::new(),
            group_by: GroupBy::None,
            edge_visibility_threshold: DEFAULT_EDGE_VISIBILITY_THRESHOLD,
            attach_legend: LegendPlacement::Omitted,
            duration_mode: DurationMode::Auto,
            category_gradients: false,
        }
    }

    pub fn model_options(&self) -> ModelOptions {
        ModelOptions {
            group_by: self.group_by,
            duration_mode: self.duration_mode,
        }
    }

    /// Output folder for this job's grouping policy
    pub fn output_dir(&self) -> PathBuf {
        self.output_folder.join(self.group_by.as_str())
    }

    /// Color table for node and edge lookup.
    ///
    /// Category grouping swaps in the category palette; with
    /// `category_gradients` each behavior additionally gets a shade of its
    /// category's color, which fails if the gradient cannot cover every
    /// behavior in the category.
    pub fn color_table(&self, model: &TransitionModel) -> Result<ColorTable, EthogramError> {
        if self.group_by != GroupBy::BehavioralCategory {
            return Ok(ColorTable::with_defaults(self.color_map.clone()));
        }

        let mut table = ColorTable::categorical(&self.color_map);
        if self.category_gradients {
            let mut by_category: BTreeMap<&str, Vec<String>> = BTreeMap::new();
            for row in &model.behaviors {
                if let Some(category) = row.scope.category() {
                    let members = by_category.entry(category).or_default();
                    if !members.contains(&row.behavior) {
                        members.push(row.behavior.clone());
                    }
                }
            }
            let mut shades = BTreeMap::new();
            for (category, behaviors) in by_category {
                if let Some(base) = table.get(category) {
                    let gradient = make_color_gradient(base.to_num(), behaviors.len());
                    for (behavior, color) in assign_colors(&behaviors, &gradient)? {
                        shades.insert(shade_key(category, &behavior), color);
                    }
                }
            }
            table.extend(shades);
        }
        Ok(table)
    }

    fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.edge_visibility_threshold) {
            return Err(format!(
                "EDGE_VISIBILITY_THRESHOLD must be within [0, 1], got {}",
                self.edge_visibility_threshold
            ));
        }
        Ok(())
    }
}

/// Color-table key of a behavior's shade within a category
pub fn shade_key(category: &str, behavior: &str) -> String {
    format!("{category}/{behavior}")
}

/// A parsed job file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobFile {
    pub jobs: Vec<JobConfig>,
}

impl JobFile {
    /// Load and resolve a job file from disk.
    pub fn load(path: &Path) -> Result<Self, EthogramError> {
        let content = std::fs::read_to_string(path).map_err(|e| EthogramError::io(path, e))?;
        Self::from_json(&content)
    }

    /// Parse and resolve a job file, applying global fallbacks.
    pub fn from_json(json: &str) -> Result<Self, EthogramError> {
        let value: Value = serde_json::from_str(json)?;
        let raw: RawJobFile = serde_json::from_value(upper_case_keys(value))?;

        let jobs = raw
            .jobs
            .into_iter()
            .enumerate()
            .map(|(idx, job)| resolve_job(idx, job, &raw.globals))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(JobFile { jobs })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct RawJobFile {
    jobs: Vec<RawJob>,
    #[serde(flatten)]
    globals: RawGlobals,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct RawGlobals {
    global_input_folder: Option<PathBuf>,
    global_output_folder: Option<PathBuf>,
    global_attach_legend: Option<bool>,
    global_edge_visibility_threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct RawJob {
    input_folder: Option<PathBuf>,
    output_folder: Option<PathBuf>,
    subject: Option<String>,
    environment: Option<String>,
    #[serde(default)]
    color_map: BTreeMap<String, String>,
    group_by: Option<String>,
    edge_visibility_threshold: Option<f64>,
    attach_legend: Option<bool>,
    duration_mode: Option<String>,
    category_gradients: Option<bool>,
}

fn resolve_job(idx: usize, raw: RawJob, globals: &RawGlobals) -> Result<JobConfig, EthogramError> {
    let input_folder = raw
        .input_folder
        .or_else(|| globals.global_input_folder.clone())
        .ok_or_else(|| EthogramError::Config(format!("job {idx}: no INPUT_FOLDER")))?;
    let output_folder = raw
        .output_folder
        .or_else(|| globals.global_output_folder.clone())
        .ok_or_else(|| EthogramError::Config(format!("job {idx}: no OUTPUT_FOLDER")))?;

    let mut job = JobConfig::new(input_folder, output_folder);

    if let Some(subject) = raw.subject {
        job.subject = subject;
    }
    if let Some(environment) = raw.environment {
        job.environment = environment;
    }

    job.color_map = raw
        .color_map
        .iter()
        .map(|(key, hex)| Ok((upper_snake(key), Color::parse(hex)?)))
        .collect::<Result<_, EthogramError>>()?;

    if let Some(group_by) = raw.group_by {
        job.group_by = GroupBy::from_token(&upper_snake(&group_by)).ok_or_else(|| {
            EthogramError::Config(format!("job {idx}: unknown GROUP_BY {group_by:?}"))
        })?;
    }

    if let Some(mode) = raw.duration_mode {
        job.duration_mode = DurationMode::from_token(&upper_snake(&mode)).ok_or_else(|| {
            EthogramError::Config(format!("job {idx}: unknown DURATION_MODE {mode:?}"))
        })?;
    }

    job.edge_visibility_threshold = raw
        .edge_visibility_threshold
        .or(globals.global_edge_visibility_threshold)
        .unwrap_or(DEFAULT_EDGE_VISIBILITY_THRESHOLD);
    job.attach_legend =
        LegendPlacement::from_flag(raw.attach_legend.or(globals.global_attach_legend));
    job.category_gradients = raw.category_gradients.unwrap_or(false);

    job.validate()
        .map_err(|e| EthogramError::Config(format!("job {idx}: {e}")))?;
    Ok(job)
}

/// Upper-case the keys of the top-level object and of every job object.
fn upper_case_keys(value: Value) -> Value {
    let Value::Object(top) = value else {
        return value;
    };

    let top: Map<String, Value> = top
        .into_iter()
        .map(|(key, value)| {
            let key = key.to_uppercase();
            let value = match (key.as_str(), value) {
                ("JOBS", Value::Array(jobs)) => {
                    Value::Array(jobs.into_iter().map(upper_case_object_keys).collect())
                }
                (_, other) => other,
            };
            (key, value)
        })
        .collect();
    Value::Object(top)
}

fn upper_case_object_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key.to_uppercase(), value))
                .collect(),
        ),
        other => other,
    }
}
