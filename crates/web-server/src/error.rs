use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Dataset error: {0}")]
    Dataset(#[from] dataset::DatasetError),
    #[error("{0}")]
    Analytics(#[from] analytics::AnalyticsError),
    #[error("Invalid filter: {0}")]
    InvalidFilter(#[from] core_types::CoreError),
    #[error("Chart error: {0}")]
    Chart(#[from] charts::ChartError),
    #[error("Configuration error: {0}")]
    Config(#[from] configuration::error::ConfigError),
    #[error("{0}")]
    Validation(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Analytics(analytics::AnalyticsError::Overflow) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Analytics(_) | AppError::InvalidFilter(_) | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Chart(charts::ChartError::UnknownKind(_)) => StatusCode::NOT_FOUND,
            AppError::Dataset(_) | AppError::Chart(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed.");
            "An internal error occurred while building the report".to_string()
        } else {
            tracing::debug!(error = %self, "Rejected request.");
            self.to_string()
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
