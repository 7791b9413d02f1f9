use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Invalid filter: {0}")]
    InvalidFilter(#[from] CoreError),

    #[error("Revenue total exceeds the representable range; narrow the filter")]
    Overflow,
}
