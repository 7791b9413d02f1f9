use analytics::{ReportEngine, ReportOptions};
use axum::{routing::get, Router};
use charts::ChartOptions;
use configuration::Config;
use core_types::FilterSpec;
use dataset::Dataset;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;
pub mod page;

/// The shared application state that all handlers can access.
///
/// Everything here is read-only after startup; each request recomputes its
/// report from `dataset`.
pub struct AppState {
    pub dataset: Dataset,
    pub engine: ReportEngine,
    /// Selection used for any filter field the request leaves out.
    /// `None` when the dataset is empty.
    pub default_filter: Option<FilterSpec>,
    pub chart_options: ChartOptions,
}

impl AppState {
    pub fn new(config: &Config, dataset: Dataset) -> Self {
        let default_filter = match dataset.default_filter(config.dashboard.default_category_limit) {
            Ok(filter) => Some(filter),
            Err(e) => {
                tracing::warn!(error = %e, "No default filter available.");
                None
            }
        };

        let engine = ReportEngine::new(ReportOptions {
            currency_label: config.dashboard.currency_label.clone(),
            top_categories: config.dashboard.top_categories,
            order_trend_window_days: config.dashboard.order_trend_window_days,
        });

        Self {
            dataset,
            engine,
            default_filter,
            chart_options: ChartOptions::default(),
        }
    }
}

/// Builds the router with every dashboard route.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/categories", get(handlers::get_categories))
        .route("/api/report", get(handlers::get_report))
        .route("/api/export.csv", get(handlers::export_csv))
        .route("/api/charts/:kind", get(handlers::get_chart))
        .with_state(state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// Serves the dashboard until the process is stopped.
pub async fn run_server(config: &Config, dataset: Dataset) -> anyhow::Result<()> {
    let addr = config.server.socket_addr()?;
    let state = Arc::new(AppState::new(config, dataset));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Dashboard listening on http://{}", addr);
    axum::serve(listener, app(state)).await?;

    Ok(())
}
