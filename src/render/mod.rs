//! Diagram rendering
//!
//! A [`RenderRequest`] turns a model into typed [`Diagram`] descriptions:
//! nodes sized by behavior probability, edges weighted by transition
//! probability and filtered by the visibility threshold. Diagrams are drawn
//! through the [`Canvas`] trait; [`DotCanvas`] produces Graphviz DOT text.
//!
//! Only the rendering path is filtered. Exported tables keep every row.

mod canvas;
mod dot;
mod legend;
mod request;
mod table;

pub use canvas::*;
pub use dot::*;
pub use legend::*;
pub use request::*;
pub use table::*;

/// Time grouping draws at most this many hourly diagrams
pub const MAX_DIAGRAM_HOURS: u32 = 3;

/// Probability as a percentage rounded to `decimals` places.
pub fn round_percent(probability: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (probability * 100.0 * scale).round() / scale
}

pub fn constrain_value(value: f64, min: f64, max: f64) -> f64 {
    value.clamp(min, max)
}

/// Whether a transition is drawn. Both sides are compared as percentages
/// rounded to one decimal, so 0.0504 is visible at a 5% threshold.
pub fn is_visible(probability: f64, threshold: f64) -> bool {
    round_percent(probability, 1) >= round_percent(threshold, 1)
}

/// Node width: `clamp(probability * 10, 0.5, 3)`
pub fn node_radius(probability: f64) -> f64 {
    constrain_value(probability * 10.0, 0.5, 3.0)
}

/// Edge stroke width: `clamp(probability * 20, 0.5, 7)`
pub fn edge_width(probability: f64) -> f64 {
    constrain_value(probability * 20.0, 0.5, 7.0)
}

/// `<subject>Behavior<env>ChainModel[Hour<n>]`
pub fn diagram_file_stem(subject: &str, environment: &str, hour: Option<u32>) -> String {
    match hour {
        Some(hour) => format!("{subject}Behavior{environment}ChainModelHour{hour}"),
        None => format!("{subject}Behavior{environment}ChainModel"),
    }
}
