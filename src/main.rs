use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use stayharvest::browser::chromium::{ChromiumBrowser, LaunchOptions};
use stayharvest::dataset::DatasetPersister;
use stayharvest::harvest::criteria::{parse_input_date, DateRange, SearchCriteria};
use stayharvest::harvest::orchestrator::Harvester;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "stayharvest",
    about = "Harvest hotel guest reviews for a city into a per-city dataset file",
    version
)]
struct Cli {
    /// City to search hotels in (e.g. "Paris")
    #[arg(long)]
    city: String,

    /// Star rating filter, 0 = no filter
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=5))]
    stars: u8,

    /// Keep only reviews on or after this date (DD-MM-YYYY)
    #[arg(long, value_parser = parse_cli_date)]
    from: Option<NaiveDate>,

    /// Keep only reviews on or before this date (DD-MM-YYYY)
    #[arg(long, value_parser = parse_cli_date)]
    to: Option<NaiveDate>,

    /// Directory for the dataset file and diagnostic screenshots
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Explicit Chromium binary path (discovered when unset)
    #[arg(long)]
    chromium: Option<PathBuf>,

    /// Run the browser with a visible window
    #[arg(long)]
    headful: bool,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

fn parse_cli_date(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_input_date(s).map_err(|_| format!("expected DD-MM-YYYY, got '{s}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("stayharvest={default_level}"))),
        )
        .init();

    let criteria = SearchCriteria::new(
        cli.city.clone(),
        cli.stars,
        DateRange::new(cli.from, cli.to),
    );
    let persister = DatasetPersister::for_city(&cli.output_dir, &criteria.sanitized_city());
    let dataset_path = persister.path().to_path_buf();

    let browser = ChromiumBrowser::launch(&LaunchOptions {
        chromium_path: cli.chromium,
        headful: cli.headful,
    })
    .await
    .context("failed to establish browser session")?;

    let harvester = Harvester::new(Box::new(browser), persister, cli.output_dir.clone());
    let summary = harvester.run(&criteria).await?;

    println!(
        "Harvest complete: {} hotels processed ({} failed), {} rows written to {}",
        summary.hotels_processed,
        summary.hotels_failed,
        summary.rows_written,
        dataset_path.display()
    );
    Ok(())
}
