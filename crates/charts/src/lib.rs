//! SVG charts for the dashboard.
//!
//! Each chart is rendered into an in-memory SVG document from a `SeriesBundle`.
//! Empty series still produce a valid document carrying a "no data" notice.

pub mod error;

pub use error::ChartError;

use analytics::{SeriesBundle, SeriesPoint};
use core_types::YearMonth;
use plotters::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Text shown in place of a chart when the selection is empty.
pub const NO_DATA_MESSAGE: &str = "No data for selected filters.";

/// The three charts the dashboard shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// Line chart of revenue per month.
    Revenue,
    /// Bar chart of orders per month.
    Orders,
    /// Horizontal bars of the top categories by revenue.
    Categories,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Revenue, ChartKind::Orders, ChartKind::Categories];

    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::Revenue => "Monthly Revenue",
            ChartKind::Orders => "Orders per Month",
            ChartKind::Categories => "Top 10 Categories by Revenue",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            ChartKind::Revenue => "revenue",
            ChartKind::Orders => "orders",
            ChartKind::Categories => "categories",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.svg", self.slug())
    }
}

impl FromStr for ChartKind {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_end_matches(".svg");
        ChartKind::ALL
            .into_iter()
            .find(|k| k.slug().eq_ignore_ascii_case(s))
            .ok_or_else(|| ChartError::UnknownKind(s.to_string()))
    }
}

/// Canvas size for rendered charts.
#[derive(Clone, Debug)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
        }
    }
}

/// Renders one chart as an SVG document.
pub fn render_chart(kind: ChartKind, series: &SeriesBundle, options: &ChartOptions) -> Result<String, ChartError> {
    let svg = match kind {
        ChartKind::Revenue => render_revenue_line(&series.revenue_by_month, kind.title(), options),
        ChartKind::Orders => render_orders_bars(&series.orders_by_month, kind.title(), options),
        ChartKind::Categories => render_category_bars(&series.top_categories, kind.title(), options),
    }?;
    tracing::debug!(chart = kind.slug(), bytes = svg.len(), "Rendered chart.");
    Ok(svg)
}

fn render_err<E: Display>(e: E) -> ChartError {
    ChartError::Render(e.to_string())
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Upper bound for a value axis: a little headroom above the max, never zero.
fn axis_max(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0_f64, f64::max);
    if max > 0.0 { max * 1.1 } else { 1.0 }
}

/// Maps an axis coordinate back to a category label. Only integral
/// coordinates carry a label; plotters may ask for fractional ones.
fn index_label(labels: &[String], coordinate: f64) -> String {
    let rounded = coordinate.round();
    if (coordinate - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}

/// Key-point budget for an index axis. Asking for more points than labels
/// keeps the step at 1 or a fraction of it, so every integral index is a key
/// point; `index_label` blanks the fractional ones.
fn label_hint(labels: usize) -> usize {
    4 * labels + 4
}

fn render_empty(title: &str, options: &ChartOptions) -> Result<String, ChartError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        let area = root
            .titled(title, ("sans-serif", 24).into_font())
            .map_err(render_err)?;
        area.draw(&Text::new(
            NO_DATA_MESSAGE,
            (20, (options.height / 3) as i32),
            ("sans-serif", 18).into_font(),
        ))
        .map_err(render_err)?;
        root.present().map_err(render_err)?;
    }
    Ok(svg)
}

fn render_revenue_line(
    points: &[SeriesPoint<YearMonth, Decimal>],
    title: &str,
    options: &ChartOptions,
) -> Result<String, ChartError> {
    if points.is_empty() {
        return render_empty(title, options);
    }

    let labels: Vec<String> = points.iter().map(|p| p.label.to_string()).collect();
    let data: Vec<(f64, f64)> = points
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, to_f64(p.value)))
        .collect();
    let y_max = axis_max(data.iter().map(|(_, y)| *y));
    let x_fmt = |x: &f64| index_label(&labels, *x);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5..(points.len() as f64 - 0.5), 0.0..y_max)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(label_hint(labels.len()))
            .x_label_formatter(&x_fmt)
            .x_desc("Month")
            .y_desc("Revenue")
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(LineSeries::new(data.iter().copied(), &BLUE))
            .map_err(render_err)?;
        chart
            .draw_series(data.iter().map(|&(x, y)| Circle::new((x, y), 3, BLUE.filled())))
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
    }
    Ok(svg)
}

fn render_orders_bars(
    points: &[SeriesPoint<YearMonth, usize>],
    title: &str,
    options: &ChartOptions,
) -> Result<String, ChartError> {
    if points.is_empty() {
        return render_empty(title, options);
    }

    let labels: Vec<String> = points.iter().map(|p| p.label.to_string()).collect();
    let y_max = axis_max(points.iter().map(|p| p.value as f64));
    let x_fmt = |x: &f64| index_label(&labels, *x);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(-0.5..(points.len() as f64 - 0.5), 0.0..y_max)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(label_hint(labels.len()))
            .x_label_formatter(&x_fmt)
            .x_desc("Month")
            .y_desc("Orders")
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(points.iter().enumerate().map(|(i, p)| {
                let x = i as f64;
                Rectangle::new([(x - 0.4, 0.0), (x + 0.4, p.value as f64)], BLUE.filled())
            }))
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
    }
    Ok(svg)
}

fn render_category_bars(
    points: &[SeriesPoint<String, Decimal>],
    title: &str,
    options: &ChartOptions,
) -> Result<String, ChartError> {
    if points.is_empty() {
        return render_empty(title, options);
    }

    // Largest revenue is drawn at the top, so the y index runs bottom-up.
    let labels: Vec<String> = points.iter().rev().map(|p| p.label.clone()).collect();
    let x_max = axis_max(points.iter().map(|p| to_f64(p.value)));
    let y_fmt = |y: &f64| index_label(&labels, *y);
    let count = points.len();

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(160)
            .build_cartesian_2d(0.0..x_max, -0.5..(count as f64 - 0.5))
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(label_hint(count))
            .y_label_formatter(&y_fmt)
            .x_desc("Revenue")
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(points.iter().enumerate().map(|(rank, p)| {
                let y = (count - 1 - rank) as f64;
                Rectangle::new([(0.0, y - 0.4), (to_f64(p.value), y + 0.4)], BLUE.filled())
            }))
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
    }
    Ok(svg)
}
