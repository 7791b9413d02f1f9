use crate::error::{DatasetError, RowError};
use crate::Dataset;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use core_types::OrderRow;
use csv::StringRecord;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Accepted header names per field. The second spelling is the column name
/// used by the cleaned ecommerce export the dashboard was first built on.
const DATE_COLUMNS: &[&str] = &["order_date", "order_purchase_timestamp"];
const CATEGORY_COLUMNS: &[&str] = &["category", "product_category_name"];
const REVENUE_COLUMNS: &[&str] = &["revenue", "order_total"];
const CUSTOMER_COLUMNS: &[&str] = &["customer_id"];

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    order_date: usize,
    category: usize,
    revenue: usize,
    customer_id: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self, DatasetError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
                .ok_or_else(|| DatasetError::MissingColumn(names[0].to_string()))
        };

        Ok(Self {
            order_date: find(DATE_COLUMNS)?,
            category: find(CATEGORY_COLUMNS)?,
            revenue: find(REVENUE_COLUMNS)?,
            customer_id: find(CUSTOMER_COLUMNS)?,
        })
    }
}

/// Loads the order table from a CSV file on disk.
pub fn load_orders(path: &Path) -> Result<Dataset, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let dataset = read_orders(file)?;
    tracing::info!(
        path = %path.display(),
        rows = dataset.len(),
        skipped = dataset.skipped(),
        "Loaded order data."
    );
    Ok(dataset)
}

/// Reads orders from any CSV source.
///
/// A header without one of the required columns fails the whole load. Rows
/// with a missing or unparseable field are dropped with a warning.
pub fn read_orders<R: Read>(reader: R) -> Result<Dataset, DatasetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut rows = Vec::new();
    let mut skipped = 0;

    for (index, result) in csv_reader.records().enumerate() {
        // Header is line 1.
        let fallback_line = index as u64 + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(line = fallback_line, error = %e, "Skipping unreadable row.");
                skipped += 1;
                continue;
            }
        };

        match parse_row(&record, &columns) {
            Ok(row) => rows.push(row),
            Err(reason) => {
                let line = record.position().map_or(fallback_line, |p| p.line());
                tracing::warn!(line, reason = %reason, "Skipping malformed row.");
                skipped += 1;
            }
        }
    }

    Ok(Dataset::with_skipped(rows, skipped))
}

fn parse_row(record: &StringRecord, columns: &ColumnMap) -> Result<OrderRow, RowError> {
    let field = |index: usize, name: &'static str| {
        record
            .get(index)
            .filter(|v| !v.is_empty())
            .ok_or(RowError::Missing(name))
    };

    let order_date = parse_date(field(columns.order_date, "order_date")?)?;
    let category = field(columns.category, "category")?.to_string();
    let revenue = parse_revenue(field(columns.revenue, "revenue")?)?;
    let customer_id = field(columns.customer_id, "customer_id")?.to_string();

    Ok(OrderRow {
        order_date,
        category,
        revenue,
        customer_id,
    })
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or RFC 3339; only the date is kept.
fn parse_date(value: &str) -> Result<NaiveDate, RowError> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(timestamp.date());
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.date_naive());
    }
    Err(RowError::Unparseable {
        field: "order_date",
        value: value.to_string(),
    })
}

fn parse_revenue(value: &str) -> Result<Decimal, RowError> {
    let revenue = Decimal::from_str(value).map_err(|_| RowError::Unparseable {
        field: "revenue",
        value: value.to_string(),
    })?;
    if revenue.is_sign_negative() && !revenue.is_zero() {
        return Err(RowError::NegativeRevenue(value.to_string()));
    }
    Ok(revenue)
}
