use super::{legend_subgraph, Canvas, Cluster, Diagram, EdgeSpec, LegendEntry, NodeSpec};
use crate::normalizer::split_to_spaced;

/// Quote a DOT identifier or string attribute.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Canvas producing Graphviz DOT for the `fdp` layout engine
#[derive(Debug, Default)]
pub struct DotCanvas {
    out: String,
    depth: usize,
}

impl DotCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finished DOT text
    pub fn into_string(self) -> String {
        self.out
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }
}

impl Canvas for DotCanvas {
    fn open_diagram(&mut self, diagram: &Diagram) {
        self.line(&format!("digraph {} {{", quote(&diagram.title)));
        self.depth += 1;

        let mut attrs = vec![
            "layout=fdp".to_string(),
            "fixedsize=true".to_string(),
            "overlap=scale".to_string(),
            "size=\"50\"".to_string(),
            "ratio=\"0.8,1!\"".to_string(),
            "fontcolor=black".to_string(),
            "fontname=\"fira-code\"".to_string(),
            "packMode=graph".to_string(),
            "compound=true".to_string(),
            "labelloc=t".to_string(),
            "rankdir=LR".to_string(),
        ];
        if let Some(background) = &diagram.background {
            attrs.push(format!("bgcolor={}", quote(background.as_str())));
        }
        self.line(&format!("graph [{}];", attrs.join(", ")));
    }

    fn open_cluster(&mut self, cluster: &Cluster) {
        self.line(&format!(
            "subgraph {} {{",
            quote(&format!("cluster_{}", cluster.category))
        ));
        self.depth += 1;
        self.line(&format!(
            "graph [label={}, rankdir=TB];",
            quote(&split_to_spaced(&cluster.category))
        ));
    }

    fn close_cluster(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("}");
    }

    fn draw_node(&mut self, node: &NodeSpec) {
        self.line(&format!(
            "{} [label=\" \", shape=circle, style=filled, fixedsize=true, penwidth=4, fontcolor=black, color={}, fillcolor=white, width={}, height={}];",
            quote(&node.behavior),
            quote(node.color.as_str()),
            node.radius,
            node.radius,
        ));
    }

    fn draw_edge(&mut self, edge: &EdgeSpec) {
        self.line(&format!(
            "{} -> {} [color={}, penwidth={}];",
            quote(&edge.source),
            quote(&edge.target),
            quote(edge.color.as_str()),
            edge.width,
        ));
    }

    fn draw_label(&mut self, text: &str) {
        self.line(&format!("label={};", quote(text)));
    }

    fn draw_legend(&mut self, entries: &[LegendEntry], show_category: bool) {
        self.out.push_str(&legend_subgraph(entries, show_category));
    }

    fn close_diagram(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("}");
    }
}

/// Render a diagram to DOT text.
pub fn to_dot(diagram: &Diagram, embed_legend: bool) -> String {
    let mut canvas = DotCanvas::new();
    diagram.draw(&mut canvas, embed_legend);
    canvas.into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn diagram() -> Diagram {
        let color = Color::parse("#e7298a").unwrap();
        Diagram {
            title: "Betta Behaviors".to_string(),
            caption: "Betta Behaviors: Transition Probability >5%".to_string(),
            hour: None,
            background: Some(Color::parse("#ccffff").unwrap()),
            clusters: vec![Cluster {
                category: "AGGRESSIVE".to_string(),
                nodes: vec![NodeSpec {
                    behavior: "BITE".to_string(),
                    color: color.clone(),
                    radius: 2.5,
                    probability: 0.25,
                }],
            }],
            nodes: Vec::new(),
            edges: vec![EdgeSpec {
                source: "BITE".to_string(),
                target: "BITE".to_string(),
                color: color.clone(),
                width: 7.0,
                probability: 1.0,
            }],
            legend: vec![LegendEntry {
                label: "Bite".to_string(),
                frequency: 25.0,
                category: Some("AGGRESSIVE".to_string()),
                color,
            }],
        }
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("A \"b\""), "\"A \\\"b\\\"\"");
        assert_eq!(quote("x\\y"), "\"x\\\\y\"");
    }

    #[test]
    fn test_dot_output() {
        let dot = to_dot(&diagram(), false);
        assert!(dot.starts_with("digraph \"Betta Behaviors\" {\n"));
        assert!(dot.contains("layout=fdp"));
        assert!(dot.contains("bgcolor=\"#CCFFFF\""));
        assert!(dot.contains("  label=\"Betta Behaviors: Transition Probability >5%\";"));
        assert!(dot.contains("  subgraph \"cluster_AGGRESSIVE\" {"));
        assert!(dot.contains("graph [label=\"Aggressive\", rankdir=TB];"));
        assert!(dot.contains("    \"BITE\" [label=\" \""));
        assert!(dot.contains("width=2.5, height=2.5"));
        assert!(dot.contains("penwidth=4, fontcolor=black, color=\"#E7298A\", fillcolor=white,"));
        assert!(dot.contains("\"BITE\" -> \"BITE\" [color=\"#E7298A\", penwidth=7];"));
        assert!(!dot.contains("Legend"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn test_embedded_legend() {
        let dot = to_dot(&diagram(), true);
        assert!(dot.contains("Legend [shape=none"));
        assert!(dot.contains("<TD>AGGRESSIVE</TD>"));
    }
}
