use super::{edge_width, is_visible, node_radius, round_percent, MAX_DIAGRAM_HOURS};
use crate::color::{Color, ColorTable};
use crate::config::{shade_key, JobConfig};
use crate::normalizer::{split_to_spaced, upper_snake};
use crate::pipeline::TransitionModel;
use crate::types::{BehaviorGroup, GroupBy, Scope, TransitionGroup};
use serde::Serialize;
use std::collections::BTreeMap;

/// A behavior node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSpec {
    pub behavior: String,
    pub color: Color,
    /// Node width, proportional to the behavior probability
    pub radius: f64,
    pub probability: f64,
}

/// A drawn transition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeSpec {
    pub source: String,
    pub target: String,
    pub color: Color,
    /// Stroke width, proportional to the transition probability
    pub width: f64,
    pub probability: f64,
}

/// Nodes of one behavioral category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub category: String,
    pub nodes: Vec<NodeSpec>,
}

/// One row of a diagram legend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    /// Display form of the behavior
    pub label: String,
    /// Behavior probability as a percentage, one decimal
    pub frequency: f64,
    pub category: Option<String>,
    pub color: Color,
}

/// A typed description of one diagram, independent of any output format
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagram {
    pub title: String,
    pub caption: String,
    pub hour: Option<u32>,
    pub background: Option<Color>,
    pub clusters: Vec<Cluster>,
    pub nodes: Vec<NodeSpec>,
    pub edges: Vec<EdgeSpec>,
    pub legend: Vec<LegendEntry>,
}

impl Diagram {
    /// Every node, clustered or not
    pub fn all_nodes(&self) -> impl Iterator<Item = &NodeSpec> {
        self.clusters
            .iter()
            .flat_map(|c| c.nodes.iter())
            .chain(self.nodes.iter())
    }

    /// Whether the legend shows a category column
    pub fn shows_category(&self) -> bool {
        !self.clusters.is_empty()
    }
}

/// Everything needed to describe a job's diagrams
pub struct RenderRequest<'a> {
    pub model: &'a TransitionModel,
    pub colors: &'a ColorTable,
    pub subject: &'a str,
    pub environment: &'a str,
    /// Minimum transition probability for a drawn edge
    pub threshold: f64,
}

impl<'a> RenderRequest<'a> {
    pub fn new(job: &'a JobConfig, model: &'a TransitionModel, colors: &'a ColorTable) -> Self {
        Self {
            model,
            colors,
            subject: &job.subject,
            environment: &job.environment,
            threshold: job.edge_visibility_threshold,
        }
    }

    /// Transitions that pass the visibility threshold
    pub fn visible_transitions(&self) -> impl Iterator<Item = &'a TransitionGroup> {
        let model: &'a TransitionModel = self.model;
        let threshold = self.threshold;
        model
            .transitions
            .iter()
            .filter(move |t| is_visible(t.probability, threshold))
    }

    /// Build the diagrams: one per hour (hours 1–3) under time grouping,
    /// otherwise a single diagram, clustered by category when grouping by
    /// category.
    pub fn diagrams(&self) -> Vec<Diagram> {
        match self.model.group_by {
            GroupBy::None => vec![self.flat_diagram(None)],
            GroupBy::Time => self
                .model
                .hours()
                .into_iter()
                .filter(|hour| *hour <= MAX_DIAGRAM_HOURS)
                .map(|hour| self.flat_diagram(Some(hour)))
                .collect(),
            GroupBy::BehavioralCategory => vec![self.category_diagram()],
        }
    }

    fn title(&self, hour: Option<u32>) -> String {
        let mut title = format!("{} Behaviors", self.subject);
        if !self.environment.is_empty() {
            title.push_str(&format!(" in {} Environment", self.environment));
        }
        if let Some(hour) = hour {
            title.push_str(&format!(" (Hour {hour})"));
        }
        title
    }

    fn caption(&self, title: &str) -> String {
        format!(
            "{title}: Transition Probability >{}%",
            round_percent(self.threshold, 1)
        )
    }

    fn empty_diagram(&self, hour: Option<u32>) -> Diagram {
        let title = self.title(hour);
        let background = match self.model.group_by {
            GroupBy::BehavioralCategory => None,
            _ if self.environment.is_empty() => None,
            _ => Some(
                self.colors
                    .resolve(&format!("ENV_{}", upper_snake(self.environment)))
                    .clone(),
            ),
        };
        Diagram {
            caption: self.caption(&title),
            title,
            hour,
            background,
            clusters: Vec::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            legend: Vec::new(),
        }
    }

    fn node(&self, row: &BehaviorGroup, color: Color) -> NodeSpec {
        NodeSpec {
            behavior: row.behavior.clone(),
            color,
            radius: node_radius(row.probability),
            probability: row.probability,
        }
    }

    fn legend_entry(&self, row: &BehaviorGroup, color: &Color) -> LegendEntry {
        LegendEntry {
            label: split_to_spaced(&row.behavior),
            frequency: round_percent(row.probability, 1),
            category: row.scope.category().map(str::to_string),
            color: color.clone(),
        }
    }

    fn edge(&self, row: &TransitionGroup, color: Color) -> EdgeSpec {
        EdgeSpec {
            source: row.behavior.clone(),
            target: row.next_behavior.clone(),
            color,
            width: edge_width(row.probability),
            probability: row.probability,
        }
    }

    /// Diagram colored by behavior, for the whole run or a single hour.
    fn flat_diagram(&self, hour: Option<u32>) -> Diagram {
        let mut diagram = self.empty_diagram(hour);
        let in_scope = |scope: &Scope| hour.is_none() || scope.hour() == hour;

        for row in self.model.behaviors.iter().filter(|b| in_scope(&b.scope)) {
            let color = self.colors.resolve(&row.behavior).clone();
            diagram.legend.push(self.legend_entry(row, &color));
            diagram.nodes.push(self.node(row, color));
        }

        for row in self.visible_transitions().filter(|t| in_scope(&t.scope)) {
            let color = self.colors.resolve(&row.behavior).clone();
            diagram.edges.push(self.edge(row, color));
        }

        diagram
    }

    /// Single diagram with one cluster per category, colored by category.
    fn category_diagram(&self) -> Diagram {
        let mut diagram = self.empty_diagram(None);
        let mut clusters: BTreeMap<&str, Vec<NodeSpec>> = BTreeMap::new();
        let mut home: BTreeMap<&str, &str> = BTreeMap::new();

        for row in &self.model.behaviors {
            let category = row.scope.category().unwrap_or_default();
            home.entry(row.behavior.as_str()).or_insert(category);

            let color = self
                .colors
                .get(&shade_key(category, &row.behavior))
                .unwrap_or_else(|| self.colors.resolve(category))
                .clone();
            diagram.legend.push(self.legend_entry(row, &color));
            clusters.entry(category).or_default().push(self.node(row, color));
        }

        for row in self.visible_transitions() {
            let category = row.scope.category().unwrap_or_default();
            let color = if home.get(row.next_behavior.as_str()) == Some(&category) {
                self.colors.resolve(category)
            } else {
                self.colors.default_color()
            };
            diagram.edges.push(self.edge(row, color.clone()));
        }

        diagram.clusters = clusters
            .into_iter()
            .map(|(category, nodes)| Cluster {
                category: category.to_string(),
                nodes,
            })
            .collect();
        diagram
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SubjectLog;
    use crate::types::EventClock;
    use pretty_assertions::assert_eq;

    fn job(group_by: GroupBy, threshold: f64) -> JobConfig {
        let mut job = JobConfig::new("in", "out");
        job.subject = "Betta".to_string();
        job.environment = "Yellow".to_string();
        job.group_by = group_by;
        job.edge_visibility_threshold = threshold;
        job
    }

    fn log(rows: &[(&str, Option<&str>, f64)]) -> SubjectLog {
        let mut log = SubjectLog::new("s1", EventClock::Elapsed);
        for (behavior, category, time) in rows {
            log.push(behavior, *category, *time);
        }
        log
    }

    #[test]
    fn test_flat_diagram() {
        let model = TransitionModel::build(
            &[log(&[("A", None, 0.0), ("B", None, 10.0), ("A", None, 25.0)])],
            GroupBy::None,
        );
        let job = job(GroupBy::None, 0.05);
        let colors = ColorTable::with_defaults(BTreeMap::from([(
            "A".to_string(),
            Color::parse("#FF0000").unwrap(),
        )]));
        let diagrams = RenderRequest::new(&job, &model, &colors).diagrams();

        assert_eq!(diagrams.len(), 1);
        let d = &diagrams[0];
        assert_eq!(d.title, "Betta Behaviors in Yellow Environment");
        assert_eq!(
            d.caption,
            "Betta Behaviors in Yellow Environment: Transition Probability >5%"
        );
        assert_eq!(d.background.as_ref().map(Color::as_str), Some("#FFFFCC"));
        assert_eq!(d.nodes.len(), 2);
        assert_eq!(d.nodes[0].color.as_str(), "#FF0000");
        assert_eq!(d.nodes[1].color.as_str(), "#FAEBD7");
        assert_eq!(d.edges.len(), 2);
        assert_eq!(d.edges[0].width, 7.0);
        assert_eq!(d.legend[0].label, "A");
        assert_eq!(d.legend[1].frequency, 33.3);
    }

    #[test]
    fn test_threshold_drops_low_edges_only_from_diagram() {
        // A is followed by B 19 times and by C once: P(A→C) = 0.05
        let mut rows = Vec::new();
        let mut t = 0.0;
        for i in 0..20 {
            rows.push(("A", None, t));
            t += 1.0;
            rows.push((if i == 0 { "C" } else { "B" }, None, t));
            t += 1.0;
        }
        let model = TransitionModel::build(&[log(&rows)], GroupBy::None);
        let ac = model
            .transitions
            .iter()
            .find(|t| t.behavior == "A" && t.next_behavior == "C")
            .unwrap();
        assert!((ac.probability - 0.05).abs() < 1e-12);

        let job = job(GroupBy::None, 0.5);
        let colors = ColorTable::with_defaults(BTreeMap::new());
        let request = RenderRequest::new(&job, &model, &colors);
        let diagram = &request.diagrams()[0];
        assert!(!diagram
            .edges
            .iter()
            .any(|e| e.source == "A" && e.target == "C"));
        assert!(diagram.edges.iter().any(|e| e.source == "A" && e.target == "B"));
    }

    #[test]
    fn test_time_diagrams_limited_to_present_hours() {
        let model = TransitionModel::build(
            &[log(&[
                ("A", None, 10.0),
                ("B", None, 20.0),
                ("A", None, 3700.0),
                ("B", None, 3800.0),
                ("C", None, 4.5 * 3600.0),
                ("A", None, 4.6 * 3600.0),
            ])],
            GroupBy::Time,
        );
        let job = job(GroupBy::Time, 0.05);
        let colors = ColorTable::with_defaults(BTreeMap::new());
        let diagrams = RenderRequest::new(&job, &model, &colors).diagrams();

        let hours: Vec<Option<u32>> = diagrams.iter().map(|d| d.hour).collect();
        assert_eq!(hours, vec![Some(1), Some(2)]);
        assert!(diagrams[0].title.ends_with("(Hour 1)"));
        assert!(diagrams[1].nodes.iter().all(|n| n.behavior != "C"));
    }

    #[test]
    fn test_category_clusters_and_edge_colors() {
        let model = TransitionModel::build(
            &[log(&[
                ("Bite", Some("Aggressive"), 0.0),
                ("Chase", Some("Aggressive"), 1.0),
                ("Court", Some("Reproductive"), 2.0),
                ("Bite", Some("Aggressive"), 3.0),
            ])],
            GroupBy::BehavioralCategory,
        );
        let job = job(GroupBy::BehavioralCategory, 0.0);
        let colors = ColorTable::categorical(&BTreeMap::new());
        let diagrams = RenderRequest::new(&job, &model, &colors).diagrams();

        assert_eq!(diagrams.len(), 1);
        let d = &diagrams[0];
        assert!(d.background.is_none());
        assert!(d.nodes.is_empty());
        let categories: Vec<&str> = d.clusters.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(categories, vec!["AGGRESSIVE", "REPRODUCTIVE"]);
        assert_eq!(d.clusters[0].nodes[0].color.as_str(), "#E7298A");
        assert_eq!(d.all_nodes().count(), 3);
        assert!(d.shows_category());

        let bite_chase = d
            .edges
            .iter()
            .find(|e| e.source == "BITE" && e.target == "CHASE")
            .unwrap();
        assert_eq!(bite_chase.color.as_str(), "#E7298A");
        let chase_court = d
            .edges
            .iter()
            .find(|e| e.source == "CHASE" && e.target == "COURT")
            .unwrap();
        assert_eq!(chase_court.color.as_str(), "#000000");
    }
}
