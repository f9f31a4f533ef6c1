use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use catalog_scraper::config::Config;
use catalog_scraper::parsers::PriceParser;
use catalog_scraper::scrapers::{ListingExtractor, PageFetcher, PageUrl};
use catalog_scraper::utils::http::HttpPageFetcher;

/// Fetch one listing page and print what the extractor sees on it.
#[derive(Parser, Debug)]
#[command(name = "analyze_page")]
#[command(about = "Fetch one category listing page and print the extracted products")]
struct Args {
    /// Category slug, e.g. lacteos
    category: String,

    /// Listing page number
    #[arg(default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,

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
    let fetcher = HttpPageFetcher::from_config(&config)?;
    let url = PageUrl::new(&config.protocol, &config.base_url).for_page(&args.category, args.page)?;

    println!("Fetching {url}...");
    let html = fetcher.fetch(&url).await?;
    println!("Fetched {} bytes", html.len());

    let extractor = ListingExtractor::new(PriceParser::new(config.thousands_separator));
    let listings = extractor.extract(&html);
    println!("Found {} listing cards", listings.len());

    for listing in &listings {
        println!(
            "\n{} [{}]\n  original:   {:?}\n  discounted: {:?}",
            listing.name, listing.category, listing.original_price_text, listing.discounted_price_text
        );
        for product in extractor.expand(listing, &args.category) {
            println!(
                "  -> original {} / discounted {}",
                product.original_price, product.discounted_price
            );
        }
    }

    Ok(())
}
