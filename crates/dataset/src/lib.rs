//! # Order Dataset
//!
//! Loading and exporting the order table. This crate is the only place that
//! knows about CSV; everything downstream works on `OrderRow` slices.

pub mod error;
pub mod export;
pub mod loader;

pub use error::{DatasetError, RowError};
pub use export::{export_csv, write_csv, CSV_HEADER};
pub use loader::{load_orders, read_orders};

use chrono::NaiveDate;
use core_types::{FilterSpec, OrderRow};
use std::collections::BTreeSet;

/// The in-memory order table, loaded once and read by every recomputation.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<OrderRow>,
    skipped: usize,
}

impl Dataset {
    pub fn new(rows: Vec<OrderRow>) -> Self {
        Self::with_skipped(rows, 0)
    }

    pub(crate) fn with_skipped(rows: Vec<OrderRow>, skipped: usize) -> Self {
        Self { rows, skipped }
    }

    pub fn rows(&self) -> &[OrderRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of input rows dropped during load.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Distinct categories in sorted order.
    pub fn categories(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|r| r.category.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Earliest and latest order dates, or `None` for an empty table.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.rows.iter().map(|r| r.order_date).min()?;
        let max = self.rows.iter().map(|r| r.order_date).max()?;
        Some((min, max))
    }

    /// The selection shown before the user touches anything: the full date
    /// range and either every category or the first `category_limit` of them.
    pub fn default_filter(&self, category_limit: Option<usize>) -> Result<FilterSpec, DatasetError> {
        let (start, end) = self.date_range().ok_or(DatasetError::Empty)?;
        let mut categories = self.categories();
        if let Some(limit) = category_limit {
            categories.truncate(limit);
        }
        Ok(FilterSpec::new(start, end, categories)?)
    }
}
