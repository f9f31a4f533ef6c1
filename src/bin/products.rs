use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use catalog_scraper::config::Config;
use catalog_scraper::models::ProductId;
use catalog_scraper::service::ProductCatalog;
use catalog_scraper::storage::{ProductStore, SqliteStorage};

/// Print stored products as JSON.
#[derive(Parser, Debug)]
#[command(name = "products")]
#[command(about = "Print stored products as JSON, or a single product by id")]
struct Args {
    /// Product id; omit to list every product
    id: Option<String>,

    /// Config file
    #[arg(long, env = "CATALOG_SCRAPER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(Some(path.as_path()))?,
        None => Config::load()?,
    };
    let storage = SqliteStorage::new(&config.database_path)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_path))?;
    storage.migrate().await?;
    let catalog = ProductCatalog::new(Arc::new(storage));

    let output = match args.id {
        Some(id) => serde_json::to_string_pretty(&catalog.get(&ProductId(id)).await?)?,
        None => serde_json::to_string_pretty(&catalog.list().await?)?,
    };
    println!("{output}");

    Ok(())
}
