//! Server-rendered HTML for the dashboard page.

use crate::handlers::FilterQuery;
use crate::AppState;
use analytics::{format_count, format_currency, Report};
use charts::ChartKind;
use core_types::FilterSpec;
use std::fmt::Write;

const STYLE: &str = "\
body{font-family:sans-serif;margin:0;display:flex;color:#222}\
aside{width:240px;padding:16px;background:#f4f5f7;min-height:100vh}\
main{flex:1;padding:16px 24px}\
.kpis{display:flex;gap:16px}\
.kpi{flex:1;border:1px solid #ddd;border-radius:6px;padding:12px}\
.kpi .value{font-size:1.5em;font-weight:bold}\
.charts{display:grid;grid-template-columns:2fr 1fr;gap:16px}\
.error{color:#b00020;font-weight:bold}\
small{color:#666}";

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Query string reproducing `filter`, for links to the export and chart routes.
pub fn filter_query_string(filter: &FilterSpec) -> String {
    let mut query = format!(
        "start={}&end={}&selection=manual",
        filter.start_date, filter.end_date
    );
    for category in &filter.categories {
        query.push_str("&category=");
        query.push_str(&urlencoding::encode(category));
    }
    query
}

fn render_sidebar(state: &AppState, start: &str, end: &str, selected: &dyn Fn(&str) -> bool) -> String {
    let mut html = String::new();
    html.push_str("<aside><h2>Filters</h2><form method=\"get\" action=\"/\">");
    let _ = write!(
        html,
        "<label>Purchase date range<br><input type=\"date\" name=\"start\" value=\"{}\"> \
         <input type=\"date\" name=\"end\" value=\"{}\"></label>",
        escape(start),
        escape(end)
    );
    html.push_str("<input type=\"hidden\" name=\"selection\" value=\"manual\">");
    html.push_str("<fieldset><legend>Product categories</legend>");
    for category in state.dataset.categories() {
        let checked = if selected(&category) { " checked" } else { "" };
        let category = escape(&category);
        let _ = write!(
            html,
            "<label><input type=\"checkbox\" name=\"category\" value=\"{category}\"{checked}> {category}</label><br>"
        );
    }
    html.push_str("</fieldset><button type=\"submit\">Apply</button></form></aside>");
    html
}

fn render_footer(state: &AppState) -> String {
    let mut html = String::from("<hr><small>Use the sidebar filters to explore different segments.</small>");
    html.push_str("<h3>Last updated</h3>");
    if let Some((min, max)) = state.dataset.date_range() {
        let _ = write!(html, "<p>Data range: {min} to {max}</p>");
    }
    if state.dataset.skipped() > 0 {
        let _ = write!(
            html,
            "<p><small>{} malformed input rows were skipped at load.</small></p>",
            format_count(state.dataset.skipped())
        );
    }
    html
}

fn wrap(title: &str, body: String) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title><style>{STYLE}</style></head>\
         <body>{body}</body></html>",
        escape(title)
    )
}

/// The full dashboard for a computed report.
pub fn render_dashboard(state: &AppState, report: &Report, svgs: &[String]) -> String {
    let filter = &report.filter;
    let currency = &state.engine.options().currency_label;
    let metrics = &report.metrics;

    let mut html = render_sidebar(
        state,
        &filter.start_date.to_string(),
        &filter.end_date.to_string(),
        &|c: &str| filter.categories.contains(c),
    );

    html.push_str("<main><h1>Ecommerce Analytics Dashboard</h1><div class=\"kpis\">");
    let cards = [
        ("Total Revenue", format_currency(metrics.total_revenue, currency)),
        ("Orders", format_count(metrics.order_count)),
        ("Avg Order Value (AOV)", format_currency(metrics.average_order_value, currency)),
        ("Unique Customers", format_count(metrics.unique_customer_count)),
    ];
    for (label, value) in cards {
        let _ = write!(
            html,
            "<div class=\"kpi\"><div>{}</div><div class=\"value\">{}</div></div>",
            escape(label),
            escape(&value)
        );
    }
    html.push_str("</div><hr><div class=\"charts\"><div>");

    for (kind, svg) in ChartKind::ALL.iter().zip(svgs) {
        if *kind == ChartKind::Categories {
            html.push_str("</div><div>");
        }
        let _ = write!(html, "<figure id=\"{}\">{svg}</figure>", kind.slug());
    }
    html.push_str("</div></div><hr><h2>Automated Insights</h2><ul>");

    for line in report.insights.iter().chain(report.order_trend.iter()) {
        let _ = write!(html, "<li>{}</li>", escape(line));
    }
    html.push_str("</ul>");

    if !report.rows.is_empty() {
        let _ = write!(
            html,
            "<p><a href=\"/api/export.csv?{}\" download>Download filtered CSV</a></p>",
            escape(&filter_query_string(filter))
        );
    }

    html.push_str(&render_footer(state));
    html.push_str("</main>");
    wrap("Ecommerce Analytics Dashboard", html)
}

/// The dashboard with the user's inputs echoed back and a validation message
/// in place of results.
pub fn render_validation_error(state: &AppState, query: &FilterQuery, message: &str) -> String {
    let start = query.start.map(|d| d.to_string()).unwrap_or_default();
    let end = query.end.map(|d| d.to_string()).unwrap_or_default();

    let selected = query.selected_categories(state.default_filter.as_ref());

    let mut html = render_sidebar(state, &start, &end, &|c: &str| selected.iter().any(|q| q == c));
    let _ = write!(
        html,
        "<main><h1>Ecommerce Analytics Dashboard</h1><p class=\"error\">{}</p>",
        escape(message)
    );
    html.push_str(&render_footer(state));
    html.push_str("</main>");
    wrap("Ecommerce Analytics Dashboard", html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<b>\"Tom & Jerry's\"</b>"), "&lt;b&gt;&quot;Tom &amp; Jerry&#39;s&quot;&lt;/b&gt;");
    }

    #[test]
    fn query_string_encodes_categories() {
        let filter = FilterSpec::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            ["Home & Garden", "Books"],
        )
        .unwrap();
        assert_eq!(
            filter_query_string(&filter),
            "start=2024-01-01&end=2024-02-01&selection=manual&category=Books&category=Home%20%26%20Garden"
        );
    }
}
