use analytics::{format_count, format_currency, format_pct, Report, ReportEngine, ReportOptions};
use anyhow::{bail, Context};
use charts::{ChartKind, ChartOptions};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, CellAlignment, ContentArrangement, Table};
use configuration::{CliOverrides, Config};
use core_types::FilterSpec;
use dataset::Dataset;
use rust_decimal::Decimal;
use std::net::SocketAddr;
use std::path::PathBuf;

/// The main entry point for the Shopboard ecommerce report.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();

    let mut config = configuration::load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    config.apply_overrides(&cli.overrides);
    let _guard = configuration::init_tracing(&config.logging)?;

    // The order table is loaded exactly once; every command recomputes from it.
    let dataset = dataset::load_orders(&config.data.path)
        .with_context(|| format!("Failed to load orders from {}", config.data.path.display()))?;

    // Execute the appropriate command
    match cli.command {
        Commands::Report(args) => handle_report(&args, &config, &dataset),
        Commands::Export(args) => handle_export(&args, &config, &dataset),
        Commands::Charts(args) => handle_charts(&args, &config, &dataset),
        Commands::Serve(args) => handle_serve(args, config, dataset).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Ecommerce analytics: filter orders by date and category, then report,
/// export, chart or serve the interactive dashboard.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (defaults to ./config.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: CliOverrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print KPIs, monthly and category tables, and insights.
    Report(ReportArgs),
    /// Write the filtered rows to a CSV file.
    Export(ExportArgs),
    /// Render the three dashboard charts as SVG files.
    Charts(ChartsArgs),
    /// Run the dashboard web server.
    Serve(ServeArgs),
}

/// The filter selection shared by every reporting command.
#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// First purchase date to include (format: YYYY-MM-DD). Defaults to the earliest order.
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last purchase date to include (format: YYYY-MM-DD). Defaults to the latest order.
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Category to include; repeat for several. Defaults to the configured default selection.
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Select no categories at all.
    #[arg(long, conflicts_with = "categories")]
    no_categories: bool,
}

#[derive(Args)]
struct ReportArgs {
    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Args)]
struct ExportArgs {
    #[command(flatten)]
    filter: FilterArgs,

    /// The output file path for the CSV.
    #[arg(long, short, default_value = "filtered_ecommerce.csv")]
    output: PathBuf,
}

#[derive(Args)]
struct ChartsArgs {
    #[command(flatten)]
    filter: FilterArgs,

    /// Directory to write `revenue.svg`, `orders.svg` and `categories.svg` into.
    #[arg(long, default_value = "charts")]
    out_dir: PathBuf,
}

#[derive(Args)]
struct ServeArgs {
    /// Address to listen on (overrides `server.host` and `server.port`).
    #[arg(long)]
    addr: Option<SocketAddr>,
}

// ==============================================================================
// Shared helpers
// ==============================================================================

fn report_engine(config: &Config) -> ReportEngine {
    ReportEngine::new(ReportOptions {
        currency_label: config.dashboard.currency_label.clone(),
        top_categories: config.dashboard.top_categories,
        order_trend_window_days: config.dashboard.order_trend_window_days,
    })
}

/// Turns the command-line selection into a validated filter, falling back to
/// the dataset's default selection for anything left out.
fn resolve_filter(args: &FilterArgs, config: &Config, dataset: &Dataset) -> anyhow::Result<FilterSpec> {
    let default = dataset
        .default_filter(config.dashboard.default_category_limit)
        .ok();

    let (start, end) = match (args.from, args.to, &default) {
        (Some(from), Some(to), _) => (from, to),
        (from, to, Some(d)) => (from.unwrap_or(d.start_date), to.unwrap_or(d.end_date)),
        _ => bail!("The dataset has no rows; pass both --from and --to."),
    };

    let categories: Vec<String> = if args.no_categories {
        Vec::new()
    } else if !args.categories.is_empty() {
        args.categories.clone()
    } else {
        default
            .map(|d| d.categories.into_iter().collect())
            .unwrap_or_default()
    };

    Ok(FilterSpec::new(start, end, categories)?)
}

fn build_report(args: &FilterArgs, config: &Config, dataset: &Dataset) -> anyhow::Result<Report> {
    let filter = resolve_filter(args, config, dataset)?;
    let report = report_engine(config).build_report(dataset.rows(), &filter)?;
    tracing::info!(
        rows = report.rows.len(),
        start = %filter.start_date,
        end = %filter.end_date,
        "Built report."
    );
    Ok(report)
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn handle_report(args: &ReportArgs, config: &Config, dataset: &Dataset) -> anyhow::Result<()> {
    let report = build_report(&args.filter, config, dataset)?;
    print!("{}", render_report(&report, &config.dashboard.currency_label, dataset));
    Ok(())
}

fn handle_export(args: &ExportArgs, config: &Config, dataset: &Dataset) -> anyhow::Result<()> {
    let report = build_report(&args.filter, config, dataset)?;
    dataset::write_csv(&report.rows, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    println!(
        "Wrote {} rows to {}",
        format_count(report.rows.len()),
        args.output.display()
    );
    Ok(())
}

fn handle_charts(args: &ChartsArgs, config: &Config, dataset: &Dataset) -> anyhow::Result<()> {
    let report = build_report(&args.filter, config, dataset)?;
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;

    let options = ChartOptions::default();
    for kind in ChartKind::ALL {
        let svg = charts::render_chart(kind, &report.series, &options)?;
        let path = args.out_dir.join(kind.file_name());
        std::fs::write(&path, svg).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

async fn handle_serve(args: ServeArgs, mut config: Config, dataset: Dataset) -> anyhow::Result<()> {
    if let Some(addr) = args.addr {
        config.server.host = addr.ip().to_string();
        config.server.port = addr.port();
    }
    web_server::run_server(&config, dataset).await
}

// ==============================================================================
// Terminal rendering
// ==============================================================================

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn right_align(table: &mut Table, columns: &[usize]) {
    for &index in columns {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
}

/// Renders the full text report: selection, KPIs, series and insights.
fn render_report(report: &Report, currency: &str, dataset: &Dataset) -> String {
    let filter = &report.filter;
    let mut out = String::new();

    out.push_str(&format!(
        "Purchase date range: {} to {}\nCategories: {}\n\n",
        filter.start_date,
        filter.end_date,
        if filter.categories.is_empty() {
            "(none)".to_string()
        } else {
            filter.categories.iter().cloned().collect::<Vec<_>>().join(", ")
        }
    ));

    let metrics = &report.metrics;
    let mut kpis = new_table(vec!["Metric", "Value"]);
    kpis.add_row(vec!["Total Revenue".to_string(), format_currency(metrics.total_revenue, currency)]);
    kpis.add_row(vec!["Orders".to_string(), format_count(metrics.order_count)]);
    kpis.add_row(vec![
        "Avg Order Value (AOV)".to_string(),
        format_currency(metrics.average_order_value, currency),
    ]);
    kpis.add_row(vec!["Unique Customers".to_string(), format_count(metrics.unique_customer_count)]);
    right_align(&mut kpis, &[1]);
    out.push_str(&format!("{kpis}\n\n"));

    if report.rows.is_empty() {
        out.push_str("No data for selected filters.\n\n");
    } else {
        let mut monthly = new_table(vec!["Month", "Revenue", "Orders"]);
        for (revenue, orders) in report
            .series
            .revenue_by_month
            .iter()
            .zip(&report.series.orders_by_month)
        {
            monthly.add_row(vec![
                revenue.label.to_string(),
                format_currency(revenue.value, currency),
                format_count(orders.value),
            ]);
        }
        right_align(&mut monthly, &[1, 2]);
        out.push_str(&format!("Monthly Revenue\n{monthly}\n\n"));

        let total = report.series.total_revenue().unwrap_or_default();
        let mut categories = new_table(vec!["#", "Category", "Revenue", "Share"]);
        for (rank, point) in report.series.top_categories.iter().enumerate() {
            let share = if total.is_zero() {
                Decimal::ZERO
            } else {
                point.value / total * Decimal::ONE_HUNDRED
            };
            categories.add_row(vec![
                (rank + 1).to_string(),
                point.label.clone(),
                format_currency(point.value, currency),
                format!("{}%", format_pct(share)),
            ]);
        }
        right_align(&mut categories, &[0, 2, 3]);
        out.push_str(&format!("Top Categories by Revenue\n{categories}\n\n"));
    }

    out.push_str("Automated Insights\n");
    for line in report.insights.iter().chain(report.order_trend.iter()) {
        out.push_str(&format!("  • {line}\n"));
    }

    if let Some((min, max)) = dataset.date_range() {
        out.push_str(&format!("\nData range: {min} to {max}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::OrderRow;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_dataset() -> Dataset {
        Dataset::new(vec![
            OrderRow::new(date(2024, 1, 5), "Electronics", dec!(100), "C1"),
            OrderRow::new(date(2024, 2, 10), "Electronics", dec!(50), "C2"),
            OrderRow::new(date(2024, 2, 15), "Books", dec!(30), "C1"),
        ])
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_parses_filters_and_overrides() {
        let cli = Cli::try_parse_from([
            "shopboard",
            "--data",
            "orders.csv",
            "report",
            "--from",
            "2024-01-01",
            "--category",
            "Books",
            "--category",
            "Toys",
        ])
        .unwrap();
        assert_eq!(cli.overrides.data, Some(PathBuf::from("orders.csv")));
        let Commands::Report(args) = cli.command else {
            panic!("expected report command");
        };
        assert_eq!(args.filter.from, Some(date(2024, 1, 1)));
        assert_eq!(args.filter.categories, vec!["Books", "Toys"]);
    }

    #[test]
    fn omitted_filter_uses_full_dataset() {
        let filter = resolve_filter(&FilterArgs::default(), &Config::default(), &sample_dataset()).unwrap();
        assert_eq!(filter.start_date, date(2024, 1, 5));
        assert_eq!(filter.end_date, date(2024, 2, 15));
        assert_eq!(filter.categories.len(), 2);
    }

    #[test]
    fn no_categories_selects_nothing() {
        let args = FilterArgs {
            no_categories: true,
            ..FilterArgs::default()
        };
        let filter = resolve_filter(&args, &Config::default(), &sample_dataset()).unwrap();
        assert!(filter.categories.is_empty());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let args = FilterArgs {
            from: Some(date(2024, 3, 1)),
            to: Some(date(2024, 1, 1)),
            ..FilterArgs::default()
        };
        let err = resolve_filter(&args, &Config::default(), &sample_dataset()).unwrap_err();
        assert!(err.to_string().contains("after end date"));
    }

    #[test]
    fn empty_dataset_needs_explicit_dates() {
        let err = resolve_filter(&FilterArgs::default(), &Config::default(), &Dataset::default()).unwrap_err();
        assert!(err.to_string().contains("--from"));
    }

    #[test]
    fn text_report_contains_tables_and_insights() {
        let dataset = sample_dataset();
        let report = build_report(&FilterArgs::default(), &Config::default(), &dataset).unwrap();
        let text = render_report(&report, "BRL", &dataset);

        assert!(text.contains("BRL 180.00"));
        assert!(text.contains("2024-02"));
        assert!(text.contains("Electronics"));
        assert!(text.contains("83.3%"));
        assert!(text.contains("Revenue decreased 20.0% in Feb 2024 vs Jan 2024"));
        assert!(text.contains("Data range: 2024-01-05 to 2024-02-15"));
    }

    #[test]
    fn empty_selection_prints_no_data() {
        let dataset = sample_dataset();
        let args = FilterArgs {
            no_categories: true,
            ..FilterArgs::default()
        };
        let report = build_report(&args, &Config::default(), &dataset).unwrap();
        let text = render_report(&report, "BRL", &dataset);
        assert!(text.contains("No data for selected filters."));
        assert!(text.contains("BRL 0.00"));
    }
}
