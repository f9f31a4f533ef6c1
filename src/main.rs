use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use catalog_scraper::config::Config;
use catalog_scraper::scrapers::CategoryWalker;
use catalog_scraper::service::DatasetReplacer;
use catalog_scraper::storage::{ProductStore, SqliteStorage};
use catalog_scraper::utils::http::HttpPageFetcher;
use catalog_scraper::utils::logging;

#[derive(Parser, Debug)]
#[command(name = "catalog-scraper")]
#[command(about = "Replace the stored product catalog with a fresh scrape")]
#[command(version)]
struct Args {
    /// Config file
    #[arg(long, env = "CATALOG_SCRAPER_CONFIG")]
    config: Option<PathBuf>,

    /// Run a single refresh even if an interval is configured
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = match &args.config {
        Some(path) => Config::load_from(Some(path.as_path()))?,
        None => Config::load()?,
    };
    logging::init(config.log_json)?;

    info!(
        "Starting catalog scraper for {}://{} ({} categories)",
        config.protocol,
        config.base_url,
        config.categories.len()
    );

    // Initialize storage
    let storage = Arc::new(
        SqliteStorage::new(&config.database_path)
            .await
            .with_context(|| format!("Failed to open database {}", config.database_path))?,
    );
    storage.migrate().await?;

    let fetcher = Arc::new(HttpPageFetcher::from_config(&config)?);
    let walker = CategoryWalker::from_config(fetcher, &config);
    let replacer = DatasetReplacer::new(storage, walker).with_timestamp_format(&config.timestamp_format);

    if args.once || config.refresh_interval_seconds == 0 {
        replacer.refresh().await.context("Refresh failed")?;
        return Ok(());
    }

    let mut interval = interval(Duration::from_secs(config.refresh_interval_seconds));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        info!("--- Starting refresh at {} ---", Local::now().format("%Y-%m-%d %H:%M:%S"));

        // The next tick retries whatever failed here.
        if let Err(e) = replacer.refresh().await {
            error!("Refresh failed: {}", e);
        }

        info!("Refresh cycle completed, waiting {} seconds", config.refresh_interval_seconds);
    }
}
