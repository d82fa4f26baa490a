use super::LegendEntry;

/// Escape text for a Graphviz HTML-like label.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// HTML-like table listing behavior, frequency, optional category and swatch.
pub fn legend_table(entries: &[LegendEntry], show_category: bool) -> String {
    let mut html = String::from(
        "<TABLE BORDER=\"0\" CELLBORDER=\"1\" CELLSPACING=\"0\" CELLPADDING=\"4\" BGCOLOR=\"transparent\">\n",
    );
    html.push_str("<TR><TD><B>Behavior</B></TD><TD><B>Frequency</B></TD>");
    if show_category {
        html.push_str("<TD><B>Category</B></TD>");
    }
    html.push_str("<TD><B>Color</B></TD></TR>\n");

    for entry in entries {
        html.push_str(&format!(
            "<TR><TD>{}</TD><TD>{}%</TD>",
            escape_html(&entry.label),
            entry.frequency
        ));
        if show_category {
            html.push_str(&format!(
                "<TD>{}</TD>",
                escape_html(entry.category.as_deref().unwrap_or_default())
            ));
        }
        html.push_str(&format!(
            "<TD CELLPADDING=\"4\"><TABLE BORDER=\"1\" CELLBORDER=\"0\" CELLSPACING=\"0\" CELLPADDING=\"0\"><TR><TD BGCOLOR=\"{}\"></TD></TR></TABLE></TD></TR>\n",
            entry.color
        ));
    }

    html.push_str("</TABLE>");
    html
}

/// Legend node statements, shared by embedded and standalone legends.
pub fn legend_subgraph(entries: &[LegendEntry], show_category: bool) -> String {
    format!(
        "  subgraph {{\n    rank = sink;\n    margin = 0;\n    label = \"\";\n    Legend [shape=none, margin=0, label=<\n{}\n>];\n  }}\n",
        legend_table(entries, show_category)
    )
}

/// A legend as its own DOT document.
pub fn standalone_legend(entries: &[LegendEntry], show_category: bool) -> String {
    format!("digraph {{\n{}}}\n", legend_subgraph(entries, show_category))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn entry(label: &str, category: Option<&str>) -> LegendEntry {
        LegendEntry {
            label: label.to_string(),
            frequency: 12.5,
            category: category.map(str::to_string),
            color: Color::parse("#a6ce69").unwrap(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b> & \"c\""), "a&lt;b&gt; &amp; &quot;c&quot;");
    }

    #[test]
    fn test_legend_rows() {
        let html = legend_table(&[entry("Lateral display", None)], false);
        assert!(html.contains("<TD>Lateral display</TD><TD>12.5%</TD>"));
        assert!(html.contains("BGCOLOR=\"#A6CE69\""));
        assert!(!html.contains("Category"));

        let html = legend_table(&[entry("Court", Some("REPRODUCTIVE"))], true);
        assert!(html.contains("<TD><B>Category</B></TD>"));
        assert!(html.contains("<TD>REPRODUCTIVE</TD>"));
    }

    #[test]
    fn test_standalone_legend_is_digraph() {
        let dot = standalone_legend(&[entry("Bite", None)], false);
        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("Legend [shape=none"));
        assert!(dot.trim_end().ends_with('}'));
    }
}
