use crate::error::DatasetError;
use core_types::OrderRow;
use std::path::Path;

/// Fixed header of every export, in column order.
pub const CSV_HEADER: [&str; 4] = ["order_date", "category", "revenue", "customer_id"];

/// Serializes rows as CSV with the fixed header. No rows yields a header-only document.
///
/// The output reads back through [`crate::read_orders`] to the same rows in the same order.
pub fn export_csv(rows: &[OrderRow]) -> Result<Vec<u8>, DatasetError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for row in rows {
        writer.write_record([
            row.order_date.format("%Y-%m-%d").to_string(),
            row.category.clone(),
            row.revenue.to_string(),
            row.customer_id.clone(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| DatasetError::Export(e.to_string()))
}

/// Writes the export to a file.
pub fn write_csv(rows: &[OrderRow], path: &Path) -> Result<(), DatasetError> {
    let bytes = export_csv(rows)?;
    std::fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "Wrote CSV export.");
    Ok(())
}
