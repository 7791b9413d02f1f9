//! # Shopboard Report Engine
//!
//! This crate turns the order table and the user's current selection into
//! everything the dashboard shows: the filtered subset, KPI metrics, chart
//! series and the short insight sentences.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of files,
//!   HTTP or configuration. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** `ReportEngine` holds only presentation options.
//!   Each call recomputes from the rows it is given.
//!
//! ## Public API
//!
//! - `ReportEngine`: filter, metrics, series, insights and the combined `build_report`.
//! - `Report`, `MetricsSnapshot`, `SeriesBundle`: the serializable outputs.
//! - `AnalyticsError`: an invalid filter range, or a revenue total too large for `Decimal`.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod format;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::{ReportEngine, ReportOptions};
pub use error::AnalyticsError;
pub use format::{format_count, format_currency, format_pct, round_pct};
pub use report::{MetricsSnapshot, Report, SeriesBundle, SeriesPoint};
