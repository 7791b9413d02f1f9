use anyhow::Context;

// This main function is the entry point when running `cargo run -p web-server`.
// It reads the same configuration as the CLI and serves the dashboard.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = configuration::load_config(None).context("Failed to load configuration")?;
    let _guard = configuration::init_tracing(&config.logging)?;

    let dataset = dataset::load_orders(&config.data.path)
        .with_context(|| format!("Failed to load orders from {}", config.data.path.display()))?;

    web_server::run_server(&config, dataset).await
}
