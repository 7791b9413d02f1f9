use crate::{error::AppError, page, AppState};
use analytics::Report;
use axum::{
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse},
    Json,
};
use axum_extra::extract::Query;
use charts::ChartKind;
use chrono::NaiveDate;
use core_types::FilterSpec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// File name offered for the filtered download.
pub const EXPORT_FILE_NAME: &str = "filtered_ecommerce.csv";

/// Filter parameters accepted by every report route.
///
/// `categories` is a comma-separated list; present but empty selects nothing.
/// The dashboard form instead submits one `category` per checked box plus
/// `selection=manual`, so that unchecking everything is distinguishable from
/// not choosing at all.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub categories: Option<String>,
    #[serde(default)]
    pub category: Vec<String>,
    pub selection: Option<String>,
}

impl FilterQuery {
    /// Fills any missing field from the default selection and validates the range.
    pub fn resolve(&self, default: Option<&FilterSpec>) -> Result<FilterSpec, AppError> {
        let missing = |field: &str| {
            AppError::Validation(format!("no data is loaded, so '{field}' must be given"))
        };

        let start = match (self.start, default) {
            (Some(start), _) => start,
            (None, Some(d)) => d.start_date,
            (None, None) => return Err(missing("start")),
        };
        let end = match (self.end, default) {
            (Some(end), _) => end,
            (None, Some(d)) => d.end_date,
            (None, None) => return Err(missing("end")),
        };

        let categories = self.selected_categories(default);
        Ok(FilterSpec::new(start, end, categories)?)
    }

    /// The category selection this query asks for: the comma list if present,
    /// else the repeated `category` keys when any were sent or the form marked
    /// the selection as manual, else the default selection.
    pub fn selected_categories(&self, default: Option<&FilterSpec>) -> Vec<String> {
        if let Some(list) = &self.categories {
            list.split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect()
        } else if !self.category.is_empty() || self.selection.is_some() {
            self.category.clone()
        } else {
            default
                .map(|d| d.categories.iter().cloned().collect())
                .unwrap_or_default()
        }
    }
}

fn build_report(state: &AppState, query: &FilterQuery) -> Result<Report, AppError> {
    let filter = query.resolve(state.default_filter.as_ref())?;
    Ok(state.engine.build_report(state.dataset.rows(), &filter)?)
}

#[derive(Debug, Serialize)]
pub struct DataRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
    pub data_range: Option<DataRange>,
    pub default_filter: Option<FilterSpec>,
    pub skipped_rows: usize,
}

/// # GET /api/categories
/// Everything a client needs to build the filter controls.
pub async fn get_categories(State(state): State<Arc<AppState>>) -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        categories: state.dataset.categories(),
        data_range: state
            .dataset
            .date_range()
            .map(|(start, end)| DataRange { start, end }),
        default_filter: state.default_filter.clone(),
        skipped_rows: state.dataset.skipped(),
    })
}

/// # GET /api/report
/// Metrics, series and insights for the requested filter.
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Report>, AppError> {
    let report = build_report(&state, &query)?;
    Ok(Json(report))
}

/// # GET /api/export.csv
/// The filtered rows as a CSV attachment. Header-only when nothing matches.
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = build_report(&state, &query)?;
    let bytes = dataset::export_csv(&report.rows)?;
    tracing::info!(rows = report.rows.len(), "Serving CSV export.");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        bytes,
    ))
}

/// # GET /api/charts/:kind
/// One chart (`revenue`, `orders` or `categories`) as SVG.
pub async fn get_chart(
    Path(kind): Path<String>,
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<impl IntoResponse, AppError> {
    let kind: ChartKind = kind.parse()?;
    let report = build_report(&state, &query)?;
    let svg = charts::render_chart(kind, &report.series, &state.chart_options)?;

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

/// # GET /
/// The interactive dashboard page. An invalid range renders the page with a
/// validation message instead of results.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Html<String>, AppError> {
    let filter = match query.resolve(state.default_filter.as_ref()) {
        Ok(filter) => filter,
        Err(AppError::InvalidFilter(e)) => {
            return Ok(Html(page::render_validation_error(&state, &query, &e.to_string())));
        }
        Err(e) => return Err(e),
    };

    let report = state.engine.build_report(state.dataset.rows(), &filter)?;
    let mut svgs = Vec::with_capacity(ChartKind::ALL.len());
    for kind in ChartKind::ALL {
        svgs.push(charts::render_chart(kind, &report.series, &state.chart_options)?);
    }

    Ok(Html(page::render_dashboard(&state, &report, &svgs)))
}
