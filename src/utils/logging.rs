use anyhow::Result;
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "catalog_scraper=info";

/// Filter from `rust_log` when given, otherwise the crate's `info` default.
fn filter(rust_log: Option<&str>) -> Result<EnvFilter> {
    Ok(EnvFilter::try_new(rust_log.unwrap_or(DEFAULT_DIRECTIVES))?)
}

/// Install the global subscriber. `RUST_LOG` replaces the default
/// `catalog_scraper=info` filter entirely when set.
pub fn init(json: bool) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = filter(rust_log.as_deref())?;

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    Ok(())
}
