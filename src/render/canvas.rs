use super::{Cluster, Diagram, EdgeSpec, LegendEntry, NodeSpec};

/// Drawing surface for diagrams.
///
/// [`Diagram::draw`] calls these in a fixed order: `open_diagram`, the
/// caption label, each cluster with its nodes, the free nodes, the edges,
/// the legend when embedded, then `close_diagram`.
pub trait Canvas {
    fn open_diagram(&mut self, diagram: &Diagram);
    fn open_cluster(&mut self, cluster: &Cluster);
    fn close_cluster(&mut self);
    fn draw_node(&mut self, node: &NodeSpec);
    fn draw_edge(&mut self, edge: &EdgeSpec);
    fn draw_label(&mut self, text: &str);
    fn draw_legend(&mut self, entries: &[LegendEntry], show_category: bool);
    fn close_diagram(&mut self);
}

impl Diagram {
    /// Draw this diagram onto a canvas, embedding the legend if asked.
    pub fn draw<C: Canvas + ?Sized>(&self, canvas: &mut C, embed_legend: bool) {
        canvas.open_diagram(self);
        canvas.draw_label(&self.caption);

        for cluster in &self.clusters {
            canvas.open_cluster(cluster);
            for node in &cluster.nodes {
                canvas.draw_node(node);
            }
            canvas.close_cluster();
        }
        for node in &self.nodes {
            canvas.draw_node(node);
        }
        for edge in &self.edges {
            canvas.draw_edge(edge);
        }

        if embed_legend {
            canvas.draw_legend(&self.legend, self.shows_category());
        }
        canvas.close_diagram();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    /// Records call order
    #[derive(Default)]
    struct Trace(Vec<String>);

    impl Canvas for Trace {
        fn open_diagram(&mut self, diagram: &Diagram) {
            self.0.push(format!("open {}", diagram.title));
        }
        fn open_cluster(&mut self, cluster: &Cluster) {
            self.0.push(format!("cluster {}", cluster.category));
        }
        fn close_cluster(&mut self) {
            self.0.push("end cluster".to_string());
        }
        fn draw_node(&mut self, node: &NodeSpec) {
            self.0.push(format!("node {}", node.behavior));
        }
        fn draw_edge(&mut self, edge: &EdgeSpec) {
            self.0.push(format!("edge {}->{}", edge.source, edge.target));
        }
        fn draw_label(&mut self, text: &str) {
            self.0.push(format!("label {text}"));
        }
        fn draw_legend(&mut self, entries: &[LegendEntry], _show_category: bool) {
            self.0.push(format!("legend {}", entries.len()));
        }
        fn close_diagram(&mut self) {
            self.0.push("close".to_string());
        }
    }

    fn node(name: &str) -> NodeSpec {
        NodeSpec {
            behavior: name.to_string(),
            color: Color::parse("#000000").unwrap(),
            radius: 1.0,
            probability: 0.1,
        }
    }

    #[test]
    fn test_draw_order() {
        let diagram = Diagram {
            title: "T".to_string(),
            caption: "C".to_string(),
            hour: None,
            background: None,
            clusters: vec![Cluster {
                category: "AGGRESSIVE".to_string(),
                nodes: vec![node("BITE")],
            }],
            nodes: vec![node("REST")],
            edges: vec![EdgeSpec {
                source: "BITE".to_string(),
                target: "REST".to_string(),
                color: Color::parse("#000000").unwrap(),
                width: 1.0,
                probability: 0.5,
            }],
            legend: Vec::new(),
        };

        let mut trace = Trace::default();
        diagram.draw(&mut trace, true);
        assert_eq!(
            trace.0,
            vec![
                "open T",
                "label C",
                "cluster AGGRESSIVE",
                "node BITE",
                "end cluster",
                "node REST",
                "edge BITE->REST",
                "legend 0",
                "close"
            ]
        );

        let mut trace = Trace::default();
        diagram.draw(&mut trace, false);
        assert!(!trace.0.iter().any(|s| s.starts_with("legend")));
    }
}
