use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Built-in defaults; files and environment variables override these.
const DEFAULT_CONFIG: &str = r#"
protocol = "https"
base_url = "cugat.cl/categoria-producto"
user_agent = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36"
request_timeout_seconds = 25
max_attempts = 3
retry_base_delay_ms = 2000
database_path = "catalog_scraper.db"
timestamp_format = "%Y-%m-%dT%H:%M:%SZ"
thousands_separator = "."
refresh_interval_seconds = 0
log_json = false

categories = [
    { category = "bebidas-alcoholicas", max_page = 10 },
    { category = "bebidas-jugos-y-aguas", max_page = 8 },
    { category = "carniceria", max_page = 2 },
    { category = "cuidado-personal", max_page = 8 },
    { category = "desayuno", max_page = 5 },
    { category = "despensa", max_page = 13 },
    { category = "dulces-y-snacks", max_page = 5 },
    { category = "ferreteria", max_page = 1 },
    { category = "la-gran-feria-cugat", max_page = 3 },
    { category = "del-mundo-a-tu-despensa", max_page = 7 },
    { category = "lacteos", max_page = 7 },
    { category = "limpieza-y-aseo", max_page = 15 },
    { category = "mascotas", max_page = 1 },
    { category = "mundo-bebe", max_page = 3 },
    { category = "mundo-congelados", max_page = 9 },
    { category = "navidad", max_page = 1 },
    { category = "panaderia-y-pasteleria", max_page = 2 },
    { category = "preparados", max_page = 1 },
    { category = "quesos-y-fiambreria", max_page = 7 },
]
"#;

/// Largest accepted `max_attempts`.
pub const MAX_ATTEMPTS_LIMIT: u32 = 10;

const DEFAULT_CONFIG_FILE: &str = "catalog-scraper.toml";
const CONFIG_PATH_ENV: &str = "CATALOG_SCRAPER_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub protocol: String,
    pub base_url: String,
    pub categories: Vec<CategoryConfig>,
    pub user_agent: String,
    pub request_timeout_seconds: u64,
    /// Total tries per page, the first request included.
    pub max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub database_path: String,
    pub timestamp_format: String,
    pub thousands_separator: char,
    /// Zero runs a single refresh and exits.
    pub refresh_interval_seconds: u64,
    pub log_json: bool,
}

/// A category slug and the hand-maintained number of listing pages it has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub category: String,
    pub max_page: u32,
}

impl CategoryConfig {
    pub fn new(category: &str, max_page: u32) -> Self {
        Self {
            category: category.to_string(),
            max_page,
        }
    }
}

impl Config {
    /// Load defaults, then the optional config file, then `SCRAPER__*` variables.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(Some(Path::new(&path)))
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml));

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let config: Config = builder
            .add_source(
                config::Environment::with_prefix("SCRAPER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.protocol != "http" && self.protocol != "https" {
            bail!("Unsupported protocol {:?}, expected http or https", self.protocol);
        }

        let base = format!("{}://{}/", self.protocol, self.base_url.trim_matches('/'));
        url::Url::parse(&base).with_context(|| format!("Invalid base url {}", self.base_url))?;

        if self.max_attempts == 0 || self.max_attempts > MAX_ATTEMPTS_LIMIT {
            bail!(
                "max_attempts must be between 1 and {}, got {}",
                MAX_ATTEMPTS_LIMIT,
                self.max_attempts
            );
        }

        for category in &self.categories {
            if category.category.trim().is_empty() {
                bail!("Category slug must not be empty");
            }
            if category.max_page == 0 {
                bail!("Category {} must have max_page of at least 1", category.category);
            }
        }

        Ok(())
    }
}
