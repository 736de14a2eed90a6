//! Chart geometry and rendering for the analytics series.
//!
//! Sales are drawn as bars, margin and ROI as filled lines, all on a
//! 300x200 canvas with 40px padding and five y-axis ticks. Each series has a
//! floor for its y-axis maximum so small values do not fill the whole
//! chart. Output is SVG for the web dashboard and block bars for the
//! terminal.

use std::fmt::Write;

use crate::models::AnalyticsSnapshot;

pub const WIDTH: f64 = 300.0;
pub const HEIGHT: f64 = 200.0;
pub const PADDING: f64 = 40.0;
/// Number of y-axis labels, including zero.
pub const Y_TICKS: u32 = 5;

const BAR_GAP: f64 = 10.0;
const ACCENT: &str = "#005bff";

fn chart_width() -> f64 {
    WIDTH - 2.0 * PADDING
}

fn chart_height() -> f64 {
    HEIGHT - 2.0 * PADDING
}

// ---------------------------------------------------------------------------
// Chart kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Sales,
    Margin,
    Roi,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Sales, ChartKind::Margin, ChartKind::Roi];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "sales" => Some(Self::Sales),
            "margin" => Some(Self::Margin),
            "roi" => Some(Self::Roi),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::Margin => "margin",
            Self::Roi => "roi",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Sales => "Sales for period",
            Self::Margin => "Margin, %",
            Self::Roi => "ROI, %",
        }
    }

    /// Suffix for axis labels.
    pub fn unit(self) -> &'static str {
        match self {
            Self::Sales => " ₽",
            Self::Margin | Self::Roi => "%",
        }
    }

    /// Lower bound for the y-axis maximum.
    pub fn floor(self) -> f64 {
        match self {
            Self::Sales => 1.0,
            Self::Margin => 50.0,
            Self::Roi => 100.0,
        }
    }

    pub fn is_bar(self) -> bool {
        matches!(self, Self::Sales)
    }

    pub fn series(self, snapshot: &AnalyticsSnapshot) -> &[f64] {
        match self {
            Self::Sales => &snapshot.sales_data,
            Self::Margin => &snapshot.margin_data,
            Self::Roi => &snapshot.roi_data,
        }
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Y-axis maximum: the largest value, but never below the kind's floor.
pub fn max_value(kind: ChartKind, data: &[f64]) -> f64 {
    data.iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(kind.floor(), f64::max)
}

/// Tick positions and their rounded labels, bottom to top.
pub fn y_ticks(max: f64) -> Vec<(f64, i64)> {
    let steps = f64::from(Y_TICKS - 1);
    (0..Y_TICKS)
        .map(|i| {
            let i = f64::from(i);
            let y = HEIGHT - PADDING - i * chart_height() / steps;
            (y, (max * i / steps).round() as i64)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One bar per value, evenly spaced with a gap. Negative values draw nothing.
pub fn bars(data: &[f64], max: f64) -> Vec<Bar> {
    if data.is_empty() || max <= 0.0 {
        return Vec::new();
    }
    let slot = chart_width() / data.len() as f64;
    let width = (slot - BAR_GAP).max(1.0);

    data.iter()
        .enumerate()
        .map(|(i, &value)| {
            let height = (value.max(0.0) / max).min(1.0) * chart_height();
            Bar {
                x: PADDING + i as f64 * slot + BAR_GAP / 2.0,
                y: HEIGHT - PADDING - height,
                width,
                height,
            }
        })
        .collect()
}

/// Line vertices spread across the full chart width.
pub fn line_points(data: &[f64], max: f64) -> Vec<(f64, f64)> {
    if max <= 0.0 {
        return Vec::new();
    }
    let step = if data.len() > 1 {
        chart_width() / (data.len() - 1) as f64
    } else {
        0.0
    };

    data.iter()
        .enumerate()
        .map(|(i, &value)| {
            let x = PADDING + i as f64 * step;
            let y = HEIGHT - PADDING - (value / max) * chart_height();
            (x, y)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// SVG
// ---------------------------------------------------------------------------

/// Render a series as a standalone SVG document.
pub fn render_svg(kind: ChartKind, data: &[f64]) -> String {
    let max = max_value(kind, data);
    let bottom = HEIGHT - PADDING;
    let right = WIDTH - PADDING;
    let mut svg = String::new();

    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {WIDTH} {HEIGHT}" width="{WIDTH}" height="{HEIGHT}" font-family="sans-serif" font-size="10">"#
    );
    let _ = write!(
        svg,
        r#"<text x="{}" y="14" text-anchor="middle" font-size="12" fill="currentColor">{}</text>"#,
        WIDTH / 2.0,
        kind.title()
    );

    for (y, label) in y_ticks(max) {
        let _ = write!(
            svg,
            r##"<line x1="{PADDING}" y1="{y:.1}" x2="{right}" y2="{y:.1}" stroke="#e0e0e0" stroke-width="0.5"/><text x="{}" y="{:.1}" text-anchor="end" fill="currentColor">{label}{}</text>"##,
            PADDING - 5.0,
            y + 3.0,
            kind.unit()
        );
    }
    let _ = write!(
        svg,
        r#"<polyline points="{PADDING},{PADDING} {PADDING},{bottom} {right},{bottom}" fill="none" stroke="currentColor" stroke-width="1"/>"#
    );

    if kind.is_bar() {
        for (i, bar) in bars(data, max).iter().enumerate() {
            let _ = write!(
                svg,
                r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{ACCENT}" rx="2"/><text x="{:.1}" y="{}" text-anchor="middle" fill="currentColor">{}</text>"#,
                bar.x,
                bar.y,
                bar.width,
                bar.height,
                bar.x + bar.width / 2.0,
                bottom + 14.0,
                i + 1
            );
        }
    } else {
        let points = line_points(data, max);
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            let path = points
                .iter()
                .map(|(x, y)| format!("{x:.1},{y:.1}"))
                .collect::<Vec<_>>()
                .join(" ");
            let _ = write!(
                svg,
                r#"<polygon points="{path} {:.1},{bottom} {:.1},{bottom}" fill="{ACCENT}" fill-opacity="0.15"/><polyline points="{path}" fill="none" stroke="{ACCENT}" stroke-width="2"/>"#,
                last.0, first.0
            );
            for (i, (x, y)) in points.iter().enumerate() {
                let _ = write!(
                    svg,
                    r#"<circle cx="{x:.1}" cy="{y:.1}" r="3" fill="{ACCENT}"/><text x="{x:.1}" y="{}" text-anchor="middle" fill="currentColor">{}</text>"#,
                    bottom + 14.0,
                    i + 1
                );
            }
        }
    }

    svg.push_str("</svg>");
    svg
}

// ---------------------------------------------------------------------------
// Terminal
// ---------------------------------------------------------------------------

/// One block bar per value, scaled to `width` characters at the y-axis maximum.
pub fn terminal_bars(kind: ChartKind, data: &[f64], width: usize) -> Vec<String> {
    let max = max_value(kind, data);
    data.iter()
        .enumerate()
        .map(|(i, &value)| {
            let filled = ((value.max(0.0) / max) * width as f64).round() as usize;
            format!(
                "{:>2} {:<width$} {:.1}{}",
                i + 1,
                "█".repeat(filled.min(width)),
                value,
                kind.unit()
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
