// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Result tables.

use std::fmt::Display;
use std::time::Duration;

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

/// Named measurements produced by one jig run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    title: String,
    rows: Vec<(String, String)>,
}

impl Report {
    /// Empty report headed by `title`.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Vec::new(),
        }
    }

    /// Appends a `metric: value` row.
    pub fn row(mut self, metric: impl Into<String>, value: impl Display) -> Self {
        self.rows.push((metric.into(), value.to_string()));
        self
    }

    /// Report title, e.g. `schedule_batch(1024, 16)`.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Value of `metric`, if present.
    pub fn get(&self, metric: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|(m, _)| m == metric)
            .map(|(_, v)| v.as_str())
    }

    /// Renders the report as a table.
    pub fn render(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![self.title.as_str(), ""]);
        for (metric, value) in &self.rows {
            table.add_row(vec![metric.as_str(), value.as_str()]);
        }
        table.to_string()
    }
}

/// Mean nanoseconds per unit, formatted to one decimal.
#[allow(clippy::cast_precision_loss)]
pub fn ns_per(total: Duration, units: usize) -> String {
    if units == 0 {
        return "-".to_owned();
    }
    format!("{:.1}", total.as_nanos() as f64 / units as f64)
}

/// `num / den` formatted to three decimals.
#[allow(clippy::cast_precision_loss)]
pub fn ratio(num: usize, den: usize) -> String {
    if den == 0 {
        return "-".to_owned();
    }
    format!("{:.3}", num as f64 / den as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_formats_three_decimals() {
        assert_eq!(ratio(1, 8), "0.125");
        assert_eq!(ratio(1, 0), "-");
    }

    #[test]
    fn rows_render_in_order() {
        let r = Report::new("demo").row("alpha", 1).row("beta", "two");
        let text = r.render();
        let a = text.find("alpha").unwrap_or(usize::MAX);
        let b = text.find("beta").unwrap_or(0);
        assert!(a < b, "{text}");
        assert_eq!(r.get("beta"), Some("two"));
        assert_eq!(r.title(), "demo");
    }

    #[test]
    fn ns_per_handles_zero_units() {
        assert_eq!(ns_per(Duration::from_nanos(10), 0), "-");
        assert_eq!(ns_per(Duration::from_nanos(10), 4), "2.5");
    }
}
