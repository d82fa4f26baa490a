use super::legend::escape_html;
use super::{is_visible, round_percent};
use crate::export::sort_transitions;
use crate::normalizer::split_to_spaced;
use crate::pipeline::TransitionModel;
use crate::types::GroupBy;
use serde::Serialize;

/// One visible transition in the state table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    /// `"Lateral display -- Bite"`
    pub transition: String,
    /// Transition probability as a percentage, two decimals
    pub frequency: f64,
    pub count: u64,
    pub hour: Option<u32>,
}

/// Tabular summary of the transitions drawn in a job's diagrams
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionTable {
    pub by_hour: bool,
    pub rows: Vec<TableRow>,
}

impl TransitionTable {
    /// Visible transitions of a model, in export order.
    pub fn from_model(model: &TransitionModel, threshold: f64) -> Self {
        let mut transitions: Vec<_> = model
            .transitions
            .iter()
            .filter(|t| is_visible(t.probability, threshold))
            .cloned()
            .collect();
        sort_transitions(&mut transitions, model.group_by);

        let rows = transitions
            .into_iter()
            .map(|t| TableRow {
                transition: format!(
                    "{} -- {}",
                    split_to_spaced(&t.behavior),
                    split_to_spaced(&t.next_behavior)
                ),
                frequency: round_percent(t.probability, 2),
                count: t.count,
                hour: t.scope.hour(),
            })
            .collect();

        Self {
            by_hour: model.group_by == GroupBy::Time,
            rows,
        }
    }

    /// The table as a DOT document with an HTML-like label.
    pub fn to_dot(&self) -> String {
        let mut html = String::from(
            "<TABLE BORDER=\"0\" CELLBORDER=\"1\" CELLSPACING=\"0\" CELLPADDING=\"4\">\n",
        );
        html.push_str("<TR><TD><B>Transition</B></TD><TD><B>Frequency</B></TD>");
        if self.by_hour {
            html.push_str("<TD><B>Total Count (by Hour)</B></TD><TD><B>Time Observed (by Hour)</B></TD>");
        } else {
            html.push_str("<TD><B>Total Count</B></TD>");
        }
        html.push_str("</TR>\n");

        for row in &self.rows {
            html.push_str(&format!(
                "<TR><TD>{}</TD><TD>{}%</TD><TD>{}</TD>",
                escape_html(&row.transition),
                row.frequency,
                row.count
            ));
            if let Some(hour) = row.hour.filter(|_| self.by_hour) {
                html.push_str(&format!("<TD>{hour}</TD>"));
            }
            html.push_str("</TR>\n");
        }
        html.push_str("</TABLE>");

        format!(
            "digraph {{\n  subgraph {{\n    bgcolor = \"white\";\n    rank = sink;\n    margin = 0;\n    label = \"\";\n    Legend [shape=none, margin=0, label=<\n{html}\n>];\n  }}\n}}\n"
        )
    }
}
