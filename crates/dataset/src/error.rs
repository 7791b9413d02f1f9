use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to open data file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Failed to write CSV export: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] core_types::CoreError),

    #[error("The dataset contains no valid rows.")]
    Empty,
}

/// Why a single input row was dropped. Never fatal; the loader logs it and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("missing value for '{0}'")]
    Missing(&'static str),

    #[error("cannot parse '{value}' as {field}")]
    Unparseable { field: &'static str, value: String },

    #[error("negative revenue {0}")]
    NegativeRevenue(String),
}
