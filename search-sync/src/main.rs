use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use search_sync::logging::{self, LogFormat};
use search_sync::{run, Cli, Dependencies, SettingsLoader};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init(LogFormat::from_env());

    let cli = Cli::parse();

    let settings = SettingsLoader::new()
        .with_config_file(cli.config.clone())
        .load()
        .context("Failed to load settings")?;

    let deps = Dependencies::new(settings);
    let report = run(&cli, &deps).await;

    info!(
        resynced = report.resynced.len(),
        ingested = report.ingested.len(),
        failures = report.failures.len(),
        "Search sync finished"
    );

    if !report.is_success() {
        bail!("{} sync step(s) failed", report.failures.len());
    }

    Ok(())
}
