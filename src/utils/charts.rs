//! SVG Chart Generator for Training Results
//!
//! Writes the learning curves (loss and accuracy per epoch) and the
//! annotated confusion-matrix heatmap as standalone SVG files.

use std::fs;
use std::path::Path;

use crate::training::TrainingHistory;
use crate::utils::metrics::ConfusionMatrix;

/// Chart styling constants
const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 500.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 80.0;
const MARGIN_LEFT: f64 = 80.0;

const HEATMAP_CELL: f64 = 44.0;
const HEATMAP_MARGIN_LEFT: f64 = 130.0;
const HEATMAP_MARGIN_TOP: f64 = 70.0;
const HEATMAP_MARGIN_BOTTOM: f64 = 120.0;
const HEATMAP_COLORBAR: f64 = 90.0;

pub const COLOR_PRIMARY: &str = "#3498db";
pub const COLOR_SECONDARY: &str = "#e67e22";
const COLOR_GRID: &str = "#ecf0f1";
const COLOR_AXIS: &str = "#2c3e50";
const COLOR_TEXT: &str = "#2c3e50";

/// Endpoints and midpoint of the diverging blue-white-red colour map
const COOLWARM_LOW: (f64, f64, f64) = (59.0, 76.0, 192.0);
const COOLWARM_MID: (f64, f64, f64) = (221.0, 221.0, 221.0);
const COOLWARM_HIGH: (f64, f64, f64) = (180.0, 4.0, 38.0);

/// A data point for a line chart
#[derive(Debug, Clone)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
}

/// A data series for charts
#[derive(Debug, Clone)]
pub struct DataSeries {
    pub name: String,
    pub points: Vec<DataPoint>,
    pub color: String,
}

impl DataSeries {
    /// Series over epochs 1..=n from a list of per-epoch values
    pub fn from_epochs(name: &str, values: &[f64], color: &str) -> Self {
        Self {
            name: name.to_string(),
            points: values
                .iter()
                .enumerate()
                .map(|(i, &y)| DataPoint { x: (i + 1) as f64, y })
                .collect(),
            color: color.to_string(),
        }
    }
}

/// How the y-axis is scaled and labelled
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum YAxis {
    /// 0..=100 with a percent suffix; values are fractions in 0..=1
    Percent,
    /// Fitted to the data, starting at 0 when all values are positive
    Auto,
}

/// Generate a line chart SVG
pub fn generate_line_chart(
    title: &str,
    x_label: &str,
    y_label: &str,
    series: &[DataSeries],
    y_axis: YAxis,
    output_path: &Path,
) -> std::io::Result<()> {
    fs::write(output_path, render_line_chart(title, x_label, y_label, series, y_axis))
}

/// Build the SVG text of a line chart
pub fn render_line_chart(
    title: &str,
    x_label: &str,
    y_label: &str,
    series: &[DataSeries],
    y_axis: YAxis,
) -> String {
    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let scale = match y_axis {
        YAxis::Percent => 100.0,
        YAxis::Auto => 1.0,
    };

    let (x_min, x_max, data_y_min, data_y_max) = find_ranges(series);
    let (y_min, y_max) = match y_axis {
        YAxis::Percent => (0.0, 100.0),
        YAxis::Auto => {
            let lo = if data_y_min >= 0.0 { 0.0 } else { data_y_min };
            let hi = if data_y_max > lo { data_y_max * 1.05 } else { lo + 1.0 };
            (lo, hi)
        }
    };
    // Single-epoch runs still get a usable x-axis
    let (x_min, x_max) = if x_max > x_min { (x_min, x_max) } else { (x_min - 1.0, x_max + 1.0) };

    let to_x = |x: f64| MARGIN_LEFT + ((x - x_min) / (x_max - x_min)) * plot_width;
    let to_y = |y: f64| MARGIN_TOP + plot_height - ((y * scale - y_min) / (y_max - y_min)) * plot_height;

    let mut svg = svg_header(CHART_WIDTH, CHART_HEIGHT);
    push_title(&mut svg, CHART_WIDTH, title);

    // Grid lines
    for i in 0..=5 {
        let y = MARGIN_TOP + plot_height - (i as f64 / 5.0) * plot_height;
        let value = y_min + (i as f64 / 5.0) * (y_max - y_min);

        svg.push_str(&format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="1"/>"#,
            MARGIN_LEFT, y, MARGIN_LEFT + plot_width, y, COLOR_GRID
        ));

        let tick = match y_axis {
            YAxis::Percent => format!("{:.0}%", value),
            YAxis::Auto => format!("{:.2}", value),
        };
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="end" font-family="Arial, sans-serif" font-size="12" fill="{}">{}</text>"#,
            MARGIN_LEFT - 10.0, y + 4.0, COLOR_TEXT, tick
        ));
    }

    // Axes
    svg.push_str(&format!(
        r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="2"/>"#,
        MARGIN_LEFT, MARGIN_TOP + plot_height, MARGIN_LEFT + plot_width, MARGIN_TOP + plot_height, COLOR_AXIS
    ));
    svg.push_str(&format!(
        r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="2"/>"#,
        MARGIN_LEFT, MARGIN_TOP, MARGIN_LEFT, MARGIN_TOP + plot_height, COLOR_AXIS
    ));

    // Axis labels
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="14" fill="{}">{}</text>"#,
        MARGIN_LEFT + plot_width / 2.0, CHART_HEIGHT - 20.0, COLOR_TEXT, escape_xml(x_label)
    ));
    svg.push_str(&format!(
        r#"<text x="20" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="14" fill="{}" transform="rotate(-90 20 {})">{}</text>"#,
        CHART_HEIGHT / 2.0, COLOR_TEXT, CHART_HEIGHT / 2.0, escape_xml(y_label)
    ));

    for series_data in series {
        if series_data.points.is_empty() {
            continue;
        }

        let path: Vec<String> = series_data
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let cmd = if i == 0 { "M" } else { "L" };
                format!("{} {:.2} {:.2}", cmd, to_x(p.x), to_y(p.y))
            })
            .collect();

        svg.push_str(&format!(
            r#"<path d="{}" fill="none" stroke="{}" stroke-width="3"/>"#,
            path.join(" "),
            series_data.color
        ));

        for point in &series_data.points {
            svg.push_str(&format!(
                r#"<circle cx="{:.2}" cy="{:.2}" r="4" fill="{}" stroke="white" stroke-width="2"/>"#,
                to_x(point.x),
                to_y(point.y),
                series_data.color
            ));
        }
    }

    // X-axis tick labels from the first series
    if let Some(first) = series.first() {
        for point in &first.points {
            svg.push_str(&format!(
                r#"<text x="{:.2}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="11" fill="{}">{:.0}</text>"#,
                to_x(point.x), MARGIN_TOP + plot_height + 20.0, COLOR_TEXT, point.x
            ));
        }
    }

    // Legend
    let mut legend_y = MARGIN_TOP + 10.0;
    for series_data in series {
        svg.push_str(&format!(
            r#"<rect x="{}" y="{}" width="15" height="15" fill="{}"/>"#,
            CHART_WIDTH - MARGIN_RIGHT - 130.0, legend_y, series_data.color
        ));
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" font-family="Arial, sans-serif" font-size="12" fill="{}">{}</text>"#,
            CHART_WIDTH - MARGIN_RIGHT - 110.0, legend_y + 12.0, COLOR_TEXT, escape_xml(&series_data.name)
        ));
        legend_y += 25.0;
    }

    svg.push_str("</svg>");
    svg
}

/// Write `loss.svg` and `accuracy.svg` for a finished training run
pub fn generate_learning_curves(history: &TrainingHistory, output_dir: &Path) -> std::io::Result<()> {
    generate_line_chart(
        "Training and validation loss",
        "Epoch",
        "Loss",
        &[
            DataSeries::from_epochs("Training Loss", &history.loss, COLOR_PRIMARY),
            DataSeries::from_epochs("Validation Loss", &history.val_loss, COLOR_SECONDARY),
        ],
        YAxis::Auto,
        &output_dir.join("loss.svg"),
    )?;

    generate_line_chart(
        "Training and validation accuracy",
        "Epoch",
        "Accuracy",
        &[
            DataSeries::from_epochs("Training Accuracy", &history.accuracy, COLOR_PRIMARY),
            DataSeries::from_epochs("Validation Accuracy", &history.val_accuracy, COLOR_SECONDARY),
        ],
        YAxis::Percent,
        &output_dir.join("accuracy.svg"),
    )
}

/// Generate an annotated confusion-matrix heatmap SVG
///
/// Rows are true classes, columns predicted classes. Every cell carries its
/// integer count.
pub fn generate_confusion_heatmap(
    title: &str,
    cm: &ConfusionMatrix,
    labels: &[&str],
    output_path: &Path,
) -> std::io::Result<()> {
    fs::write(output_path, render_confusion_heatmap(title, cm, labels))
}

/// Build the SVG text of a confusion-matrix heatmap
pub fn render_confusion_heatmap(title: &str, cm: &ConfusionMatrix, labels: &[&str]) -> String {
    let n = cm.num_classes;
    let grid = n as f64 * HEATMAP_CELL;
    let width = HEATMAP_MARGIN_LEFT + grid + HEATMAP_COLORBAR;
    let height = HEATMAP_MARGIN_TOP + grid + HEATMAP_MARGIN_BOTTOM;
    let max = cm.max_count().max(1) as f64;

    let label = |i: usize| -> String {
        labels
            .get(i)
            .map(|l| l.to_string())
            .unwrap_or_else(|| i.to_string())
    };

    let mut svg = svg_header(width, height);
    push_title(&mut svg, width, title);

    for row in 0..n {
        for col in 0..n {
            let count = cm.get(row, col);
            let t = count as f64 / max;
            let x = HEATMAP_MARGIN_LEFT + col as f64 * HEATMAP_CELL;
            let y = HEATMAP_MARGIN_TOP + row as f64 * HEATMAP_CELL;
            let text_color = if (t - 0.5).abs() > 0.3 { "white" } else { COLOR_TEXT };

            svg.push_str(&format!(
                r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="white" stroke-width="1"/>"#,
                x, y, HEATMAP_CELL, HEATMAP_CELL, coolwarm(t)
            ));
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="11" fill="{}">{}</text>"#,
                x + HEATMAP_CELL / 2.0, y + HEATMAP_CELL / 2.0 + 4.0, text_color, count
            ));
        }
    }

    // Row labels (true class)
    for row in 0..n {
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="end" font-family="Arial, sans-serif" font-size="11" fill="{}">{}</text>"#,
            HEATMAP_MARGIN_LEFT - 8.0,
            HEATMAP_MARGIN_TOP + row as f64 * HEATMAP_CELL + HEATMAP_CELL / 2.0 + 4.0,
            COLOR_TEXT,
            escape_xml(&label(row))
        ));
    }

    // Column labels (predicted class), rotated
    let label_y = HEATMAP_MARGIN_TOP + grid + 12.0;
    for col in 0..n {
        let x = HEATMAP_MARGIN_LEFT + col as f64 * HEATMAP_CELL + HEATMAP_CELL / 2.0;
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="end" font-family="Arial, sans-serif" font-size="11" fill="{}" transform="rotate(-45 {} {})">{}</text>"#,
            x, label_y, COLOR_TEXT, x, label_y, escape_xml(&label(col))
        ));
    }

    svg.push_str(&format!(
        r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="14" fill="{}">Predicted label</text>"#,
        HEATMAP_MARGIN_LEFT + grid / 2.0, height - 15.0, COLOR_TEXT
    ));
    svg.push_str(&format!(
        r#"<text x="18" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="14" fill="{}" transform="rotate(-90 18 {})">True label</text>"#,
        HEATMAP_MARGIN_TOP + grid / 2.0, COLOR_TEXT, HEATMAP_MARGIN_TOP + grid / 2.0
    ));

    // Colour bar
    let bar_x = HEATMAP_MARGIN_LEFT + grid + 25.0;
    let steps = 20;
    for i in 0..steps {
        let t = 1.0 - i as f64 / (steps - 1) as f64;
        svg.push_str(&format!(
            r#"<rect x="{}" y="{:.2}" width="18" height="{:.2}" fill="{}"/>"#,
            bar_x,
            HEATMAP_MARGIN_TOP + i as f64 * grid / steps as f64,
            grid / steps as f64 + 0.5,
            coolwarm(t)
        ));
    }
    for (value, y) in [(max, HEATMAP_MARGIN_TOP + 10.0), (0.0, HEATMAP_MARGIN_TOP + grid)] {
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" font-family="Arial, sans-serif" font-size="11" fill="{}">{:.0}</text>"#,
            bar_x + 24.0, y, COLOR_TEXT, value
        ));
    }

    svg.push_str("</svg>");
    svg
}

/// Map `t` in 0..=1 onto the blue-white-red diverging palette
fn coolwarm(t: f64) -> String {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: (f64, f64, f64), b: (f64, f64, f64), s: f64| {
        (a.0 + (b.0 - a.0) * s, a.1 + (b.1 - a.1) * s, a.2 + (b.2 - a.2) * s)
    };
    let (r, g, b) = if t < 0.5 {
        lerp(COOLWARM_LOW, COOLWARM_MID, t * 2.0)
    } else {
        lerp(COOLWARM_MID, COOLWARM_HIGH, (t - 0.5) * 2.0)
    };
    format!("#{:02x}{:02x}{:02x}", r.round() as u8, g.round() as u8, b.round() as u8)
}

fn svg_header(width: f64, height: f64) -> String {
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="{}" height="{}">"#,
        width, height, width, height
    );
    svg.push_str(&format!(r#"<rect width="{}" height="{}" fill="white"/>"#, width, height));
    svg
}

fn push_title(svg: &mut String, width: f64, title: &str) {
    svg.push_str(&format!(
        r#"<text x="{}" y="35" text-anchor="middle" font-family="Arial, sans-serif" font-size="18" font-weight="bold" fill="{}">{}</text>"#,
        width / 2.0, COLOR_TEXT, escape_xml(title)
    ));
}

fn find_ranges(series: &[DataSeries]) -> (f64, f64, f64, f64) {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;

    for s in series {
        for p in &s.points {
            x_min = x_min.min(p.x);
            x_max = x_max.max(p.x);
            y_min = y_min.min(p.y);
            y_max = y_max.max(p.y);
        }
    }

    if !x_min.is_finite() {
        return (0.0, 1.0, 0.0, 1.0);
    }

    (x_min, x_max, y_min, y_max)
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
