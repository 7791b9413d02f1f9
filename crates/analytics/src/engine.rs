use crate::error::AnalyticsError;
use crate::format::{format_currency, format_pct, round_pct};
use crate::report::{MetricsSnapshot, Report, SeriesBundle, SeriesPoint};
use chrono::TimeDelta;
use core_types::{FilterSpec, OrderRow, YearMonth};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};

/// Presentation parameters for the engine.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Label prefixed to money amounts in insight text.
    pub currency_label: String,
    /// Maximum length of the top-categories series.
    pub top_categories: usize,
    /// Window length, in days, for the recent order trend.
    pub order_trend_window_days: i64,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            currency_label: "BRL".to_string(),
            top_categories: 10,
            order_trend_window_days: 30,
        }
    }
}

/// A stateless calculator that turns the order table and a filter into a report.
///
/// Nothing is cached between calls: every interaction recomputes from the rows.
#[derive(Debug, Default)]
pub struct ReportEngine {
    options: ReportOptions,
}

impl ReportEngine {
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    /// The main entry point: filter, then derive every view of the subset.
    ///
    /// Fails when the filter's range is inverted, in which case nothing is
    /// computed, or when a revenue total leaves the `Decimal` range.
    pub fn build_report(&self, rows: &[OrderRow], filter: &FilterSpec) -> Result<Report, AnalyticsError> {
        let filtered = self.apply_filter(rows, filter)?;
        let metrics = self.compute_metrics(&filtered)?;
        let series = self.compute_series(&filtered)?;
        let insights = self.compute_insights(&series);
        let order_trend = self.recent_order_trend(&filtered);

        Ok(Report {
            filter: filter.clone(),
            metrics,
            series,
            insights,
            order_trend,
            rows: filtered,
        })
    }

    /// Keeps the rows matching the filter, preserving input order.
    ///
    /// An empty category selection yields an empty result, not an error.
    pub fn apply_filter(&self, rows: &[OrderRow], filter: &FilterSpec) -> Result<Vec<OrderRow>, AnalyticsError> {
        filter.validate()?;

        let filtered: Vec<OrderRow> = rows.iter().filter(|r| filter.matches(r)).cloned().collect();
        tracing::debug!(
            input = rows.len(),
            kept = filtered.len(),
            start = %filter.start_date,
            end = %filter.end_date,
            categories = filter.categories.len(),
            "Applied filter."
        );
        Ok(filtered)
    }

    /// Calculates the KPI snapshot. An empty slice yields all zeros.
    pub fn compute_metrics(&self, rows: &[OrderRow]) -> Result<MetricsSnapshot, AnalyticsError> {
        let mut metrics = MetricsSnapshot::new();

        metrics.total_revenue = checked_total(rows.iter().map(|r| r.revenue))?;
        metrics.order_count = rows.len();
        metrics.unique_customer_count = rows
            .iter()
            .map(|r| r.customer_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        if metrics.order_count > 0 {
            metrics.average_order_value = metrics.total_revenue / Decimal::from(metrics.order_count);
        }

        Ok(metrics)
    }

    /// Groups rows by calendar month and by category.
    pub fn compute_series(&self, rows: &[OrderRow]) -> Result<SeriesBundle, AnalyticsError> {
        let mut by_month: BTreeMap<YearMonth, (Decimal, usize)> = BTreeMap::new();
        let mut by_category: BTreeMap<&str, Decimal> = BTreeMap::new();

        for row in rows {
            let month = by_month.entry(row.month()).or_insert((Decimal::ZERO, 0));
            month.0 = add_revenue(month.0, row.revenue)?;
            month.1 += 1;

            let category = by_category.entry(row.category.as_str()).or_insert(Decimal::ZERO);
            *category = add_revenue(*category, row.revenue)?;
        }

        let revenue_by_month = by_month
            .iter()
            .map(|(month, (revenue, _))| SeriesPoint::new(*month, *revenue))
            .collect();
        let orders_by_month = by_month
            .iter()
            .map(|(month, (_, orders))| SeriesPoint::new(*month, *orders))
            .collect();

        // BTreeMap yields labels in order and the sort is stable, so equal
        // revenues stay in label order.
        let mut top_categories: Vec<SeriesPoint<String, Decimal>> = by_category
            .into_iter()
            .map(|(category, revenue)| SeriesPoint::new(category.to_string(), revenue))
            .collect();
        top_categories.sort_by(|a, b| b.value.cmp(&a.value));
        top_categories.truncate(self.options.top_categories);

        Ok(SeriesBundle {
            revenue_by_month,
            orders_by_month,
            top_categories,
        })
    }

    /// Produces the month-over-month revenue line and the top category line.
    ///
    /// Either line is omitted when its series is too short to say anything.
    pub fn compute_insights(&self, series: &SeriesBundle) -> Vec<String> {
        let mut insights = Vec::new();

        if let Some(line) = self.month_over_month_insight(series) {
            insights.push(line);
        }
        if let Some(line) = self.top_category_insight(series) {
            insights.push(line);
        }

        insights
    }

    fn month_over_month_insight(&self, series: &SeriesBundle) -> Option<String> {
        let [.., prev, last] = series.revenue_by_month.as_slice() else {
            return None;
        };
        let currency = &self.options.currency_label;
        let last_rev = format_currency(last.value, currency);

        if prev.value.is_zero() {
            return Some(format!(
                "Revenue in {}: {} (no previous month data to compare).",
                last.label.label(),
                last_rev
            ));
        }

        let prev_rev = format_currency(prev.value, currency);
        let Some(pct) = pct_change(prev.value, last.value) else {
            let direction = if last.value > prev.value { "increased" } else { "decreased" };
            return Some(format!(
                "Revenue {} in {} vs {} ({} vs {}).",
                direction,
                last.label.label(),
                prev.label.label(),
                last_rev,
                prev_rev
            ));
        };
        let line = if pct.is_zero() {
            format!(
                "Revenue was flat in {} vs {} ({} vs {}).",
                last.label.label(),
                prev.label.label(),
                last_rev,
                prev_rev
            )
        } else {
            let direction = if pct.is_sign_positive() { "increased" } else { "decreased" };
            format!(
                "Revenue {} {}% in {} vs {} ({} vs {}).",
                direction,
                format_pct(pct),
                last.label.label(),
                prev.label.label(),
                last_rev,
                prev_rev
            )
        };
        Some(line)
    }

    fn top_category_insight(&self, series: &SeriesBundle) -> Option<String> {
        let top = series.top_categories.first()?;
        let share = match series.total_revenue() {
            Some(total) if !total.is_zero() => top.value / total * Decimal::ONE_HUNDRED,
            _ => Decimal::ZERO,
        };

        Some(format!(
            "Top category (by revenue): {}, {} ({}% of revenue).",
            top.label,
            format_currency(top.value, &self.options.currency_label),
            format_pct(share)
        ))
    }

    /// Compares order counts in the most recent window, ending at the latest
    /// order date, with the window of equal length just before it.
    ///
    /// `None` when there are no rows, or when the window reaches past the
    /// calendar `NaiveDate` can represent.
    pub fn recent_order_trend(&self, rows: &[OrderRow]) -> Option<String> {
        let latest = rows.iter().map(|r| r.order_date).max()?;
        let window = self.options.order_trend_window_days;

        let recent_start = latest.checked_sub_signed(TimeDelta::try_days(window.checked_sub(1)?)?)?;
        let prior_start = recent_start.checked_sub_signed(TimeDelta::try_days(window)?)?;

        let recent = rows.iter().filter(|r| r.order_date >= recent_start).count();
        let prior = rows
            .iter()
            .filter(|r| r.order_date >= prior_start && r.order_date < recent_start)
            .count();

        if prior == 0 {
            return Some(format!(
                "Orders in last {window} days: {recent} (no prior {window}-day comparison available)."
            ));
        }

        let change = pct_change(Decimal::from(prior), Decimal::from(recent))?;
        let line = if change.is_zero() {
            format!("Orders in the most recent {window} days were flat compared to prior {window} days.")
        } else {
            let direction = if change.is_sign_positive() { "increased" } else { "decreased" };
            format!(
                "Orders in the most recent {window} days {direction} {}% compared to prior {window} days.",
                format_pct(change)
            )
        };
        Some(line)
    }
}

/// Sums revenue, failing instead of panicking when the total leaves the
/// `Decimal` range.
fn checked_total(values: impl IntoIterator<Item = Decimal>) -> Result<Decimal, AnalyticsError> {
    values.into_iter().try_fold(Decimal::ZERO, add_revenue)
}

fn add_revenue(total: Decimal, revenue: Decimal) -> Result<Decimal, AnalyticsError> {
    total.checked_add(revenue).ok_or(AnalyticsError::Overflow)
}

/// Percentage change from `from` to `to`, rounded to the one decimal place
/// the insight text shows. `None` when `from` is zero or the ratio overflows.
fn pct_change(from: Decimal, to: Decimal) -> Option<Decimal> {
    let pct = to
        .checked_sub(from)?
        .checked_div(from)?
        .checked_mul(Decimal::ONE_HUNDRED)?;
    Some(round_pct(pct))
}
