use crate::error::ConfigError;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Upper bound for `dashboard.order_trend_window_days`, ten years.
pub const MAX_ORDER_TREND_WINDOW_DAYS: i64 = 3650;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an absent `config.toml` yields a usable config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataSettings,
    pub dashboard: DashboardSettings,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

/// Where the order table lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Path to the orders CSV, loaded once at startup.
    pub path: PathBuf,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/processed/ecommerce_clean.csv"),
        }
    }
}

/// Presentation and report parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// Label prefixed to money amounts, e.g. "BRL 1,234.56".
    pub currency_label: String,
    /// When set, the default selection is the first N categories in sorted
    /// order instead of every category.
    pub default_category_limit: Option<usize>,
    /// Length of the top-categories series.
    pub top_categories: usize,
    /// Window length for the recent order trend insight.
    pub order_trend_window_days: i64,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            currency_label: "BRL".to_string(),
            default_category_limit: None,
            top_categories: 10,
            order_trend_window_days: 30,
        }
    }
}

/// Contains parameters for the dashboard HTTP server.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::ValidationError(format!("invalid server address: {e}")))
    }
}

/// Contains parameters for the tracing subscriber.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "shopboard.log".to_string(),
        }
    }
}

/// Command-line overrides layered on top of the loaded configuration.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct CliOverrides {
    /// Path to the orders CSV (overrides `data.path`).
    #[cfg_attr(feature = "clap", arg(long, global = true))]
    pub data: Option<PathBuf>,

    /// Currency label used when formatting money (overrides `dashboard.currency_label`).
    #[cfg_attr(feature = "clap", arg(long, global = true))]
    pub currency: Option<String>,

    /// Log filter directive, e.g. "debug" (overrides `logging.level`).
    #[cfg_attr(feature = "clap", arg(long, global = true))]
    pub log_level: Option<String>,
}

impl Config {
    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dashboard.top_categories == 0 {
            return Err(ConfigError::ValidationError(
                "dashboard.top_categories must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_ORDER_TREND_WINDOW_DAYS).contains(&self.dashboard.order_trend_window_days) {
            return Err(ConfigError::ValidationError(format!(
                "dashboard.order_trend_window_days must be between 1 and {MAX_ORDER_TREND_WINDOW_DAYS}"
            )));
        }
        if self.dashboard.default_category_limit == Some(0) {
            return Err(ConfigError::ValidationError(
                "dashboard.default_category_limit must be at least 1 when set".to_string(),
            ));
        }
        self.server.socket_addr()?;
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(path) = &overrides.data {
            self.data.path = path.clone();
        }
        if let Some(currency) = &overrides.currency {
            self.dashboard.currency_label = currency.clone();
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.clone();
        }
    }
}
