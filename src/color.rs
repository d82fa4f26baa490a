//! Color values and lookup
//!
//! Colors are `#RRGGBB` strings. A [`ColorTable`] is built once per job and
//! passed to whatever needs a lookup; keys without an entry resolve to a
//! default instead of failing.

use crate::error::EthogramError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Largest 24-bit color value
pub const MAX_HEX_VALUE: u32 = 0xFF_FF_FF;

/// Table key for the fallback color
pub const DEFAULT_KEY: &str = "DEFAULT";

/// Fallback for keys missing from the table (antique white)
pub const DEFAULT_COLOR_HEX: &str = "#FAEBD7";

/// Built-in environment backgrounds
pub const ENV_YELLOW_HEX: &str = "#FFFFCC";
pub const ENV_BLUE_HEX: &str = "#CCFFFF";

/// Built-in category palette used when grouping by behavioral category
const CATEGORY_PALETTE: [(&str, &str); 4] = [
    ("AGGRESSIVE", "#E7298A"),
    ("REPRODUCTIVE", "#A6CE69"),
    ("AVERSIVE", "#8C564B"),
    (DEFAULT_KEY, "#000000"),
];

/// A validated `#RRGGBB` color, stored upper-case
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

impl Color {
    /// Parse a case-agnostic `#RRGGBB` string.
    pub fn parse(hex: &str) -> Result<Self, EthogramError> {
        let hex = hex.trim();
        if !is_valid_color_hex(hex) {
            return Err(EthogramError::InvalidColor(hex.to_string()));
        }
        Ok(Color(hex.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the color
    pub fn to_num(&self) -> u32 {
        color_to_num(self)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Color {
    type Error = EthogramError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.0
    }
}

/// `#` followed by exactly six hex digits, any case.
pub fn is_valid_color_hex(hex: &str) -> bool {
    hex.len() == 7
        && hex.starts_with('#')
        && hex[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Zero-padded `#RRGGBB` for the low 24 bits of `value`.
pub fn num_to_color(value: u32) -> Color {
    Color(format!("#{:06X}", value & MAX_HEX_VALUE))
}

pub fn color_to_num(color: &Color) -> u32 {
    // Color is validated on construction
    u32::from_str_radix(&color.0[1..], 16).unwrap_or(0)
}

/// Shades derived from `base` by OR-ing evenly spaced offsets into it.
///
/// The step is `ceil(MAX / (partitions + 1))`, so the result never holds more
/// shades than requested. From roughly 4096 partitions the rounded step can
/// leave it one short, which callers detect through [`assign_colors`].
pub fn make_color_gradient(base: u32, partitions: usize) -> Vec<Color> {
    let step = MAX_HEX_VALUE.div_ceil(partitions as u32 + 1);
    (step..MAX_HEX_VALUE)
        .step_by(step as usize)
        .map(|offset| num_to_color(base | offset))
        .collect()
}

/// Pair values with colors one-to-one.
pub fn assign_colors(
    values: &[String],
    colors: &[Color],
) -> Result<BTreeMap<String, Color>, EthogramError> {
    if values.len() != colors.len() {
        return Err(EthogramError::MismatchedListLengths {
            values: values.len(),
            colors: colors.len(),
        });
    }
    Ok(values.iter().cloned().zip(colors.iter().cloned()).collect())
}

/// Pure lookup: the table's color for `key`, or `default`.
pub fn resolve_color<'a>(key: &str, table: &'a ColorTable, default: &'a Color) -> &'a Color {
    table.get(key).unwrap_or(default)
}

/// Color lookup table keyed by canonical tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorTable {
    entries: BTreeMap<String, Color>,
    fallback: Color,
}

impl ColorTable {
    /// Table from configured entries plus the built-in defaults
    /// (`DEFAULT`, `ENV_YELLOW`, `ENV_BLUE`) for keys the caller left out.
    pub fn with_defaults(entries: BTreeMap<String, Color>) -> Self {
        let mut table = ColorTable {
            entries,
            fallback: Color(DEFAULT_COLOR_HEX.to_string()),
        };
        table.insert_missing(DEFAULT_KEY, DEFAULT_COLOR_HEX);
        table.insert_missing("ENV_YELLOW", ENV_YELLOW_HEX);
        table.insert_missing("ENV_BLUE", ENV_BLUE_HEX);
        table
    }

    /// Table for category grouping: configured category colors first, then
    /// the built-in category palette, plus environment backgrounds.
    pub fn categorical(entries: &BTreeMap<String, Color>) -> Self {
        let mut table = ColorTable {
            entries: entries.clone(),
            fallback: Color(DEFAULT_COLOR_HEX.to_string()),
        };
        for (key, hex) in CATEGORY_PALETTE {
            table.insert_missing(key, hex);
        }
        table.insert_missing("ENV_YELLOW", ENV_YELLOW_HEX);
        table.insert_missing("ENV_BLUE", ENV_BLUE_HEX);
        table
    }

    fn insert_missing(&mut self, key: &str, hex: &str) {
        if !self.entries.contains_key(key) {
            self.entries
                .insert(key.to_string(), Color(hex.to_string()));
        }
    }

    pub fn get(&self, key: &str) -> Option<&Color> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, color: Color) {
        self.entries.insert(key.into(), color);
    }

    pub fn extend(&mut self, colors: BTreeMap<String, Color>) {
        self.entries.extend(colors);
    }

    /// Color used for unknown keys: the table's `DEFAULT` entry
    pub fn default_color(&self) -> &Color {
        self.entries.get(DEFAULT_KEY).unwrap_or(&self.fallback)
    }

    /// Color for `key`, substituting the default for unknown keys.
    pub fn resolve(&self, key: &str) -> &Color {
        resolve_color(key, self, self.default_color())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(&str, &str)]) -> BTreeMap<String, Color> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Color::parse(v).unwrap()))
            .collect()
    }

    #[test]
    fn test_color_validation() {
        assert!(is_valid_color_hex("#000000"));
        assert!(is_valid_color_hex("#2Ab3eD"));
        assert!(!is_valid_color_hex("000000"));
        assert!(!is_valid_color_hex("#12345"));
        assert!(!is_valid_color_hex("#12345G"));
        assert_eq!(Color::parse("#2ab3ed").unwrap().as_str(), "#2AB3ED");
        assert!(matches!(
            Color::parse("red"),
            Err(EthogramError::InvalidColor(_))
        ));
    }

    #[test]
    fn test_num_round_trip() {
        assert_eq!(num_to_color(0).as_str(), "#000000");
        assert_eq!(num_to_color(0xAB).as_str(), "#0000AB");
        assert_eq!(color_to_num(&Color::parse("#FFFFFF").unwrap()), MAX_HEX_VALUE);
    }

    #[test]
    fn test_resolve_color_falls_back() {
        let table = ColorTable::with_defaults(entries(&[("CHASE", "#FF0000")]));
        assert_eq!(table.resolve("CHASE").as_str(), "#FF0000");
        assert_eq!(table.resolve("UNKNOWN").as_str(), DEFAULT_COLOR_HEX);

        let other = Color::parse("#123456").unwrap();
        assert_eq!(resolve_color("UNKNOWN", &table, &other), &other);
    }

    #[test]
    fn test_configured_default_wins() {
        let table = ColorTable::with_defaults(entries(&[("DEFAULT", "#101010")]));
        assert_eq!(table.resolve("ANYTHING").as_str(), "#101010");
        assert_eq!(table.resolve("ENV_BLUE").as_str(), ENV_BLUE_HEX);
    }

    #[test]
    fn test_categorical_palette() {
        let table = ColorTable::categorical(&entries(&[("AVERSIVE", "#ABCDEF")]));
        assert_eq!(table.resolve("AGGRESSIVE").as_str(), "#E7298A");
        assert_eq!(table.resolve("AVERSIVE").as_str(), "#ABCDEF");
        assert_eq!(table.resolve("SOMETHING_ELSE").as_str(), "#000000");
    }

    #[test]
    fn test_gradient_sizes() {
        assert_eq!(make_color_gradient(0, 2).len(), 2);
        assert_eq!(make_color_gradient(0, 3).len(), 3);
        assert!(make_color_gradient(0, 0).is_empty());
        assert_eq!(make_color_gradient(0, 10_000).len(), 9_999);
        let shades = make_color_gradient(0xE7298A, 2);
        assert!(shades.iter().all(|c| c.to_num() & 0xE7298A == 0xE7298A));
    }

    #[test]
    fn test_assign_colors_length_mismatch() {
        let values = vec!["A".to_string(), "B".to_string()];
        let colors = make_color_gradient(0, 1);
        let err = assign_colors(&values, &colors).unwrap_err();
        assert!(matches!(
            err,
            EthogramError::MismatchedListLengths { values: 2, colors: 1 }
        ));

        let colors = make_color_gradient(0, 2);
        let assigned = assign_colors(&values, &colors).unwrap();
        assert_eq!(assigned.len(), 2);
    }
}
