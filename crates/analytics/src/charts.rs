//! Inline SVG/HTML chart markup for `{label, value}` series.

use std::f64::consts::PI;
use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::stats::round_ratio;

pub const PALETTE: [&str; 8] = [
    "#D35400", "#27AE60", "#3498DB", "#9B59B6", "#E74C3C", "#F39C12", "#1ABC9C", "#34495E",
];

pub const DEFAULT_PIE_SIZE: u32 = 150;
pub const DEFAULT_BAR_WIDTH: u32 = 300;
pub const DEFAULT_BAR_HEIGHT: u32 = 150;

const MIN_BAR_WIDTH: f64 = 25.0;
const BAR_GAP: f64 = 4.0;
const BAR_PADDING: f64 = 20.0;
/// Room under the bars for the rotated labels.
const LABEL_SPACE: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartDatum {
    pub label: String,
    pub value: i64,
}

impl ChartDatum {
    pub fn new(label: impl Into<String>, value: i64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

fn color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Pie chart starting at twelve o'clock and running clockwise.
pub fn pie_chart(data: &[ChartDatum], size: u32) -> String {
    let size_f = f64::from(size);
    let center = size_f / 2.0;
    let radius = center - 10.0;
    let total: i64 = data.iter().map(|d| d.value).sum();

    if total == 0 {
        return format!(
            r##"<svg width="{size}" height="{size}" viewBox="0 0 {size} {size}"><circle cx="{center}" cy="{center}" r="{radius}" fill="#eee"/><text x="{center}" y="{center}" text-anchor="middle" dy="0.3em" fill="#999" font-size="12">No data</text></svg>"##
        );
    }

    let mut paths = String::new();
    let mut angle = -PI / 2.0;
    for (index, datum) in data.iter().enumerate() {
        let slice = datum.value as f64 / total as f64 * 2.0 * PI;
        let end = angle + slice;
        let fill = color(index);

        if datum.value == total {
            // A single full slice cannot be drawn as an arc.
            let _ = write!(
                paths,
                r##"<circle cx="{center}" cy="{center}" r="{radius}" fill="{fill}" stroke="#fff" stroke-width="2"/>"##
            );
        } else {
            let (x1, y1) = (center + radius * angle.cos(), center + radius * angle.sin());
            let (x2, y2) = (center + radius * end.cos(), center + radius * end.sin());
            let large_arc = u8::from(slice > PI);
            let _ = write!(
                paths,
                r##"<path d="M {center} {center} L {x1} {y1} A {radius} {radius} 0 {large_arc} 1 {x2} {y2} Z" fill="{fill}" stroke="#fff" stroke-width="2"/>"##
            );
        }
        angle = end;
    }

    format!(r#"<svg width="{size}" height="{size}" viewBox="0 0 {size} {size}">{paths}</svg>"#)
}

/// Legend rows matching [`pie_chart`] colours, with each share in whole
/// percent.
pub fn legend(data: &[ChartDatum]) -> String {
    let total: i64 = data.iter().map(|d| d.value).sum();
    let mut out = String::new();
    for (index, datum) in data.iter().enumerate() {
        let percentage = if total > 0 { round_ratio(datum.value * 100, total) } else { 0 };
        let _ = write!(
            out,
            r#"<div class="legend-item"><span class="legend-color" style="background: {color}"></span><span class="legend-label">{label}</span><span class="legend-value">{value} ({percentage}%)</span></div>"#,
            color = color(index),
            label = escape(&datum.label),
            value = datum.value,
        );
    }
    out
}

/// Vertical bar chart. The chart widens past `width` so bars never get
/// narrower than the minimum bar width.
pub fn bar_chart(data: &[ChartDatum], width: u32, height: u32) -> String {
    if data.is_empty() {
        let (x, y) = (f64::from(width) / 2.0, f64::from(height) / 2.0);
        return format!(
            r##"<svg width="{width}" height="{height}"><text x="{x}" y="{y}" text-anchor="middle" fill="#999">No data</text></svg>"##
        );
    }

    let count = data.len() as f64;
    let chart_width = f64::from(width).max(count * (MIN_BAR_WIDTH + BAR_GAP) + BAR_PADDING * 2.0);
    let max_value = data.iter().map(|d| d.value).max().unwrap_or(1).max(1) as f64;
    let bar_width = MIN_BAR_WIDTH.max((chart_width - BAR_PADDING * 2.0) / count - BAR_GAP);
    let chart_height = f64::from(height) - LABEL_SPACE;

    let mut bars = String::new();
    for (index, datum) in data.iter().enumerate() {
        let bar_height = datum.value as f64 / max_value * chart_height;
        let x = BAR_PADDING + index as f64 * (bar_width + BAR_GAP);
        let y = chart_height - bar_height + 10.0;
        let mid = x + bar_width / 2.0;
        let label_y = chart_height + 20.0;

        let _ = write!(
            bars,
            r##"<rect x="{x}" y="{y}" width="{bar_width}" height="{h}" fill="#D35400" rx="2"/>"##,
            h = bar_height.max(1.0),
        );
        let _ = write!(
            bars,
            r##"<text x="{mid}" y="{label_y}" text-anchor="end" font-size="9" fill="#666" transform="rotate(-45 {mid} {label_y})">{label}</text>"##,
            label = escape(&datum.label),
        );
        if datum.value > 0 {
            let _ = write!(
                bars,
                r##"<text x="{mid}" y="{vy}" text-anchor="middle" font-size="9" fill="#333">{value}</text>"##,
                vy = y - 3.0,
                value = datum.value,
            );
        }
    }

    format!(r#"<svg width="{chart_width}" height="{height}" style="min-width: {chart_width}px">{bars}</svg>"#)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[(&str, i64)]) -> Vec<ChartDatum> {
        values.iter().map(|(l, v)| ChartDatum::new(*l, *v)).collect()
    }

    #[test]
    fn pie_without_data_shows_placeholder() {
        for data in [vec![], series(&[("Pizza", 0), ("Other", 0)])] {
            let svg = pie_chart(&data, 150);
            assert!(svg.contains("No data"));
            assert!(svg.contains(r##"<circle cx="75" cy="75" r="65" fill="#eee"/>"##));
            assert!(!svg.contains("<path"));
        }
    }

    #[test]
    fn pie_slices_start_at_top_and_cycle_colours() {
        let data: Vec<ChartDatum> = (0..9).map(|i| ChartDatum::new(format!("s{i}"), 1)).collect();
        let svg = pie_chart(&data, DEFAULT_PIE_SIZE);

        assert_eq!(svg.matches("<path").count(), 9);
        assert!(svg.starts_with(r#"<svg width="150" height="150" viewBox="0 0 150 150">"#));
        // First slice begins straight above the centre.
        assert!(svg.contains("M 75 75 L 75 10 A 65 65 0 0 1"));
        assert_eq!(svg.matches(PALETTE[0]).count(), 2);
    }

    #[test]
    fn pie_large_arc_flag_tracks_slice_size() {
        let svg = pie_chart(&series(&[("Pizza", 3), ("Other", 1)]), 150);
        assert!(svg.contains(" 0 1 1 "));
        assert!(svg.contains(" 0 0 1 "));

        let single = pie_chart(&series(&[("Pizza", 5)]), 150);
        assert!(single.contains(r##"<circle cx="75" cy="75" r="65" fill="#D35400""##));
    }

    #[test]
    fn legend_rounds_shares() {
        let html = legend(&series(&[("Pizza", 2), ("Quesadilla", 1)]));
        assert!(html.contains(r#"<span class="legend-value">2 (67%)</span>"#));
        assert!(html.contains(r#"<span class="legend-value">1 (33%)</span>"#));
        assert!(html.contains("background: #27AE60"));
        assert_eq!(html.matches("legend-item").count(), 2);

        assert!(legend(&series(&[("Pizza", 0)])).contains("0 (0%)"));
        assert!(legend(&[]).is_empty());
        assert!(legend(&series(&[("Ham & Cheese", 1)])).contains("Ham &amp; Cheese"));
    }

    #[test]
    fn bar_chart_geometry() {
        let svg = bar_chart(&series(&[("Mon", 10), ("Tue", 5), ("Wed", 0)]), 300, 150);
        assert!(svg.starts_with(r#"<svg width="300" height="150" style="min-width: 300px">"#));
        // Full-height bar: (300 - 40) / 3 - 4 wide, 100 tall, topped at y = 10.
        let width = 260.0 / 3.0 - 4.0;
        assert!(svg.contains(&format!(r#"<rect x="20" y="10" width="{width}" height="100""#)));
        // Zero values still draw a 1px bar but no value label.
        assert!(svg.contains(r##"height="1" fill="#D35400""##));
        assert_eq!(svg.matches(r##"fill="#333""##).count(), 2);
        assert!(svg.contains("rotate(-45"));
    }

    #[test]
    fn bar_chart_widens_for_many_bars() {
        let data: Vec<ChartDatum> = (1..=31).map(|d| ChartDatum::new(d.to_string(), d)).collect();
        let svg = bar_chart(&data, 300, 150);
        // 31 * (25 + 4) + 40
        assert!(svg.starts_with(r#"<svg width="939" height="150" style="min-width: 939px">"#));
        assert!(bar_chart(&[], 300, 150).contains(r#"<text x="150" y="75""#));
    }
}
