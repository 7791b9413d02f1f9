use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    CliOverrides, Config, DashboardSettings, DataSettings, LoggingSettings, ServerSettings,
};

/// Loads the application configuration.
///
/// Sources, lowest precedence first: built-in defaults, the TOML file (the
/// given path, which must exist, or an optional `config.toml` in the working
/// directory), then `SHOPBOARD__SECTION__KEY` environment variables, which may
/// also come from a `.env` file.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();

    let file_source = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("config").required(false),
    };

    let builder = config::Config::builder()
        .add_source(file_source)
        .add_source(
            config::Environment::with_prefix("SHOPBOARD")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.dashboard.top_categories, 10);
        assert_eq!(config.dashboard.order_trend_window_days, 30);
        assert_eq!(config.dashboard.currency_label, "BRL");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let file = write_config(
            r#"
            [data]
            path = "orders.csv"

            [dashboard]
            currency_label = "USD"
            default_category_limit = 6
            "#,
        );
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.data.path, Path::new("orders.csv"));
        assert_eq!(config.dashboard.currency_label, "USD");
        assert_eq!(config.dashboard.default_category_limit, Some(6));
        assert_eq!(config.dashboard.top_categories, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn invalid_values_fail_validation() {
        let file = write_config(
            r#"
            [dashboard]
            top_categories = 0
            "#,
        );
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn trend_window_must_stay_in_bounds() {
        let mut config = Config::default();
        config.dashboard.order_trend_window_days = settings::MAX_ORDER_TREND_WINDOW_DAYS;
        config.validate().unwrap();

        for days in [0, settings::MAX_ORDER_TREND_WINDOW_DAYS + 1, 1_000_000_000] {
            config.dashboard.order_trend_window_days = days;
            assert!(
                matches!(config.validate(), Err(ConfigError::ValidationError(_))),
                "{days} days should be rejected"
            );
        }
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }

    #[test]
    fn overrides_replace_loaded_values() {
        let mut config = Config::default();
        config.apply_overrides(&CliOverrides {
            data: Some("other.csv".into()),
            currency: Some("EUR".to_string()),
            log_level: None,
        });
        assert_eq!(config.data.path, Path::new("other.csv"));
        assert_eq!(config.dashboard.currency_label, "EUR");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn bad_host_is_rejected() {
        let mut config = Config::default();
        config.server.host = "not a host".to_string();
        assert!(config.validate().is_err());
    }
}
