//! SVG line charts for a simulated series.
//!
//! Every chart plots one value per retirement year and marks a fixed set of
//! checkpoint years with a dot and a formatted label.

mod format;

pub use format::{format_dollars, format_percent};

use serde::Serialize;

use crate::core::YearlySeries;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 400.0;
const MARGIN_LEFT: f64 = 96.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 44.0;
const MARGIN_BOTTOM: f64 = 52.0;
const LABEL_OFFSET: f64 = 8.0;
const TARGET_TICKS: f64 = 5.0;

pub const DOLLAR_CHECKPOINTS: [u32; 6] = [1, 10, 20, 30, 40, 50];
pub const TAX_CHECKPOINTS: [u32; 11] = [1, 5, 10, 15, 20, 25, 30, 35, 40, 45, 50];

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    TotalAssets,
    TaxRate,
    AnnualSpending,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [
        ChartKind::TotalAssets,
        ChartKind::TaxRate,
        ChartKind::AnnualSpending,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::TotalAssets => "Total Retirement Asset Over Time",
            ChartKind::TaxRate => "401k Tax Rate Over the Years",
            ChartKind::AnnualSpending => "Annual Spending After Retirement",
        }
    }

    pub fn y_label(self) -> &'static str {
        match self {
            ChartKind::TotalAssets => "Total Assets ($)",
            ChartKind::TaxRate => "Annual Tax Rate",
            ChartKind::AnnualSpending => "Annual Spending",
        }
    }

    pub fn legend(self) -> &'static str {
        match self {
            ChartKind::TotalAssets => "Total Assets ($)",
            ChartKind::TaxRate => "Tax Rates of 401k",
            ChartKind::AnnualSpending => "Annual Spending",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            ChartKind::TotalAssets => "total_assets.svg",
            ChartKind::TaxRate => "tax_rate.svg",
            ChartKind::AnnualSpending => "annual_spending.svg",
        }
    }

    pub fn checkpoints(self) -> &'static [u32] {
        match self {
            ChartKind::TaxRate => &TAX_CHECKPOINTS,
            ChartKind::TotalAssets | ChartKind::AnnualSpending => &DOLLAR_CHECKPOINTS,
        }
    }

    pub fn format_value(self, value: f64) -> String {
        match self {
            ChartKind::TaxRate => format_percent(value),
            ChartKind::TotalAssets | ChartKind::AnnualSpending => format_dollars(value),
        }
    }

    /// Values plotted by this chart, first entry is year 1.
    pub fn values(self, series: &YearlySeries) -> Vec<f64> {
        match self {
            ChartKind::TotalAssets => series.total_assets().to_vec(),
            ChartKind::TaxRate => series.recorded_tax_rates(),
            ChartKind::AnnualSpending => series.spending().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub year: u32,
    pub value: f64,
    pub label: String,
}

/// Checkpoint years that exist in `values`, with their labels.
pub fn annotations(kind: ChartKind, values: &[f64]) -> Vec<Annotation> {
    kind.checkpoints()
        .iter()
        .filter(|year| (**year as usize) <= values.len())
        .map(|&year| {
            let value = values[year as usize - 1];
            Annotation {
                year,
                value,
                label: kind.format_value(value),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct Axis {
    min: f64,
    max: f64,
    step: f64,
}

impl Axis {
    fn for_values(values: &[f64]) -> Self {
        let (mut lo, mut hi) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });
        if !lo.is_finite() || !hi.is_finite() {
            lo = 0.0;
            hi = 1.0;
        }
        lo = lo.min(0.0);
        if (hi - lo).abs() < f64::EPSILON {
            hi = lo + 1.0;
        }
        let step = nice_step((hi - lo) / TARGET_TICKS);
        Self {
            min: (lo / step).floor() * step,
            max: (hi / step).ceil() * step,
            step,
        }
    }

    fn ticks(self) -> Vec<f64> {
        let count = ((self.max - self.min) / self.step).round() as usize;
        (0..=count)
            .map(|i| self.min + i as f64 * self.step)
            .collect()
    }
}

fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let residual = raw / magnitude;
    let factor = if residual < 1.5 {
        1.0
    } else if residual < 3.0 {
        2.0
    } else if residual < 7.0 {
        5.0
    } else {
        10.0
    };
    factor * magnitude
}

struct Frame {
    x_max: f64,
    y: Axis,
}

impl Frame {
    fn x(&self, year: f64) -> f64 {
        let plot_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        MARGIN_LEFT + (year - 1.0) / (self.x_max - 1.0) * plot_width
    }

    fn y(&self, value: f64) -> f64 {
        let plot_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        HEIGHT - MARGIN_BOTTOM - (value - self.y.min) / (self.y.max - self.y.min) * plot_height
    }
}

pub fn render_svg(kind: ChartKind, series: &YearlySeries) -> String {
    render_values(kind, &kind.values(series))
}

pub fn render_all(series: &YearlySeries) -> Vec<(ChartKind, String)> {
    ChartKind::ALL
        .iter()
        .map(|&kind| (kind, render_svg(kind, series)))
        .collect()
}

fn render_values(kind: ChartKind, values: &[f64]) -> String {
    let frame = Frame {
        x_max: values.len().max(2) as f64,
        y: Axis::for_values(values),
    };
    let left = MARGIN_LEFT;
    let right = WIDTH - MARGIN_RIGHT;
    let top = MARGIN_TOP;
    let bottom = HEIGHT - MARGIN_BOTTOM;

    let mut svg = String::with_capacity(8 * 1024);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif">"#
    ));
    svg.push_str(&format!(
        r#"<rect width="{WIDTH}" height="{HEIGHT}" fill="white"/><text x="{}" y="24" text-anchor="middle" font-size="16">{}</text>"#,
        WIDTH / 2.0,
        kind.title()
    ));

    for tick in frame.y.ticks() {
        let y = frame.y(tick);
        let label = match kind {
            ChartKind::TaxRate => format!("{tick:.2}"),
            ChartKind::TotalAssets | ChartKind::AnnualSpending => format_dollars(tick.trunc()),
        };
        svg.push_str(&format!(
            r##"<line x1="{left}" y1="{y:.1}" x2="{right}" y2="{y:.1}" stroke="#ddd"/><text x="{:.1}" y="{:.1}" text-anchor="end" font-size="10">{label}</text>"##,
            left - 6.0,
            y + 3.0
        ));
    }

    for year in x_ticks(frame.x_max as u32) {
        let x = frame.x(year as f64);
        svg.push_str(&format!(
            r##"<line x1="{x:.1}" y1="{top}" x2="{x:.1}" y2="{bottom}" stroke="#ddd"/><text x="{x:.1}" y="{:.1}" text-anchor="middle" font-size="10">{year}</text>"##,
            bottom + 14.0
        ));
    }

    svg.push_str(&format!(
        r#"<line x1="{left}" y1="{bottom}" x2="{right}" y2="{bottom}" stroke="black"/><line x1="{left}" y1="{top}" x2="{left}" y2="{bottom}" stroke="black"/>"#
    ));
    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="12">Years After Retirement</text>"#,
        (left + right) / 2.0,
        HEIGHT - 12.0
    ));
    svg.push_str(&format!(
        r#"<text x="16" y="{:.1}" text-anchor="middle" font-size="12" transform="rotate(-90 16 {:.1})">{}</text>"#,
        (top + bottom) / 2.0,
        (top + bottom) / 2.0,
        kind.y_label()
    ));

    if !values.is_empty() {
        let points = values
            .iter()
            .enumerate()
            .map(|(idx, value)| format!("{:.1},{:.1}", frame.x(idx as f64 + 1.0), frame.y(*value)))
            .collect::<Vec<_>>()
            .join(" ");
        svg.push_str(&format!(
            r##"<polyline points="{points}" fill="none" stroke="#1f77b4" stroke-width="2"/>"##
        ));
    }

    for annotation in annotations(kind, values) {
        let x = frame.x(annotation.year as f64);
        let y = frame.y(annotation.value);
        svg.push_str(&format!(
            r#"<circle cx="{x:.1}" cy="{y:.1}" r="3" fill="black"/><text x="{x:.1}" y="{:.1}" text-anchor="middle" font-size="8">{}</text>"#,
            y - LABEL_OFFSET,
            annotation.label
        ));
    }

    svg.push_str(&format!(
        r##"<rect x="{:.1}" y="{:.1}" width="150" height="22" fill="white" stroke="#ccc"/><line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="#1f77b4" stroke-width="2"/><text x="{:.1}" y="{:.1}" font-size="10">{}</text>"##,
        right - 156.0,
        top + 6.0,
        right - 148.0,
        top + 17.0,
        right - 128.0,
        top + 17.0,
        right - 122.0,
        top + 21.0,
        kind.legend()
    ));
    svg.push_str("</svg>");
    svg
}

fn x_ticks(x_max: u32) -> Vec<u32> {
    let step = if x_max <= 10 { 1 } else { 10 };
    let mut ticks = vec![1];
    ticks.extend((step..=x_max).step_by(step as usize).filter(|year| *year > 1));
    ticks
}
