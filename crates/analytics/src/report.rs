use core_types::{FilterSpec, OrderRow, YearMonth};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The four headline numbers shown as KPI cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_revenue: Decimal,
    pub order_count: usize,
    /// `total_revenue / order_count`, or zero when there are no orders.
    pub average_order_value: Decimal,
    pub unique_customer_count: usize,
}

impl MetricsSnapshot {
    /// A zeroed-out snapshot, the result for an empty selection.
    pub fn new() -> Self {
        Self {
            total_revenue: Decimal::ZERO,
            order_count: 0,
            average_order_value: Decimal::ZERO,
            unique_customer_count: 0,
        }
    }
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// One point of a chart series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint<K, V> {
    pub label: K,
    pub value: V,
}

impl<K, V> SeriesPoint<K, V> {
    pub fn new(label: K, value: V) -> Self {
        Self { label, value }
    }
}

/// The three aggregate series behind the charts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesBundle {
    /// Chronological, one point per month that has at least one order.
    pub revenue_by_month: Vec<SeriesPoint<YearMonth, Decimal>>,
    /// Same months as `revenue_by_month`.
    pub orders_by_month: Vec<SeriesPoint<YearMonth, usize>>,
    /// Revenue descending, ties by category label, at most the configured top N.
    pub top_categories: Vec<SeriesPoint<String, Decimal>>,
}

impl SeriesBundle {
    /// Revenue across every month, which is also revenue across every category.
    /// `None` if the sum overflows.
    pub fn total_revenue(&self) -> Option<Decimal> {
        self.revenue_by_month
            .iter()
            .try_fold(Decimal::ZERO, |total, p| total.checked_add(p.value))
    }
}

/// Everything one recomputation produces for the current filter.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub filter: FilterSpec,
    pub metrics: MetricsSnapshot,
    pub series: SeriesBundle,
    pub insights: Vec<String>,
    pub order_trend: Option<String>,
    /// The filtered rows, kept for export; not part of the JSON payload.
    #[serde(skip)]
    pub rows: Vec<OrderRow>,
}
