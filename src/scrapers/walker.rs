use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

use crate::config::{CategoryConfig, Config};
use crate::error::{FetchError, ScrapeError};
use crate::models::Product;
use crate::scrapers::{ListingExtractor, PageFetcher};

/// Builds `<protocol>://<base_url>/<category>/page/<n>/` listing URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUrl {
    protocol: String,
    base_url: String,
}

impl PageUrl {
    pub fn new(protocol: &str, base_url: &str) -> Self {
        Self {
            protocol: protocol.to_string(),
            base_url: base_url.trim_matches('/').to_string(),
        }
    }

    pub fn for_page(&self, category: &str, page: u32) -> Result<String, FetchError> {
        let raw = format!(
            "{}://{}/{}/page/{}/",
            self.protocol, self.base_url, category, page
        );
        Url::parse(&raw)
            .map(String::from)
            .map_err(|source| FetchError::InvalidUrl { url: raw, source })
    }
}

/// Visits every page of every configured category in order.
pub struct CategoryWalker {
    fetcher: Arc<dyn PageFetcher>,
    extractor: ListingExtractor,
    categories: Vec<CategoryConfig>,
    urls: PageUrl,
}

impl CategoryWalker {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: ListingExtractor,
        categories: Vec<CategoryConfig>,
        urls: PageUrl,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            categories,
            urls,
        }
    }

    pub fn from_config(fetcher: Arc<dyn PageFetcher>, config: &Config) -> Self {
        Self::new(
            fetcher,
            ListingExtractor::new(crate::parsers::PriceParser::new(config.thousands_separator)),
            config.categories.clone(),
            PageUrl::new(&config.protocol, &config.base_url),
        )
    }

    pub fn categories(&self) -> &[CategoryConfig] {
        &self.categories
    }

    /// Scrape all categories. Not-found pages are skipped; any other fetch
    /// failure aborts the whole walk.
    pub async fn walk(&self) -> Result<Vec<Product>, ScrapeError> {
        let mut products = Vec::new();

        for category in &self.categories {
            let found = self.walk_category(category).await?;
            info!("Scraped {} products from {}", found.len(), category.category);
            products.extend(found);
        }

        Ok(products)
    }

    pub async fn walk_category(&self, category: &CategoryConfig) -> Result<Vec<Product>, ScrapeError> {
        let mut products = Vec::new();

        for page in 1..=category.max_page {
            let abort = |source: FetchError| ScrapeError {
                category: category.category.clone(),
                page,
                source,
            };

            let url = self.urls.for_page(&category.category, page).map_err(abort)?;
            info!("Scraping {} page {}/{}", category.category, page, category.max_page);

            match self.fetcher.fetch(&url).await {
                Ok(html) => products.extend(self.extractor.products(&html, &category.category)),
                Err(e) if e.is_not_found() => {
                    warn!("Skipping {}: page {} does not exist", category.category, page);
                }
                Err(e) => return Err(abort(e)),
            }
        }

        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn card(name: &str, price: &str) -> String {
        format!(
            r#"<div class="product-small box">
                <div class="name product-title"><a href="/">{name}</a></div>
                <div class="price"><span class="woocommerce-Price-amount amount">{price}</span></div>
            </div>"#
        )
    }

    enum Page {
        Html(String),
        NotFound,
        Broken,
    }

    /// Serves canned pages keyed by URL and records the order of requests.
    #[derive(Default)]
    struct CannedFetcher {
        pages: HashMap<String, Page>,
        requested: Mutex<Vec<String>>,
    }

    impl CannedFetcher {
        fn page(mut self, url: &str, page: Page) -> Self {
            self.pages.insert(url.to_string(), page);
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for CannedFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            match self.pages.get(url) {
                Some(Page::Html(html)) => Ok(html.clone()),
                Some(Page::NotFound) | None => Err(FetchError::NotFound { url: url.to_string() }),
                Some(Page::Broken) => Err(FetchError::Status {
                    url: url.to_string(),
                    status: StatusCode::BAD_GATEWAY,
                }),
            }
        }
    }

    fn url(category: &str, page: u32) -> String {
        format!("https://tienda.test/categoria-producto/{category}/page/{page}/")
    }

    fn walker(fetcher: Arc<CannedFetcher>, categories: Vec<CategoryConfig>) -> CategoryWalker {
        CategoryWalker::new(
            fetcher,
            ListingExtractor::default(),
            categories,
            PageUrl::new("https", "tienda.test/categoria-producto"),
        )
    }

    fn names(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn builds_listing_urls() {
        let urls = PageUrl::new("http", "127.0.0.1:8080/categoria-producto/");
        assert_eq!(
            urls.for_page("lacteos", 3).unwrap(),
            "http://127.0.0.1:8080/categoria-producto/lacteos/page/3/"
        );
    }

    #[tokio::test]
    async fn skips_not_found_pages() {
        let fetcher = Arc::new(
            CannedFetcher::default()
                .page(&url("lacteos", 1), Page::Html(card("Leche", "$990")))
                .page(&url("lacteos", 2), Page::NotFound)
                .page(&url("lacteos", 3), Page::Html(card("Yogurt", "$450"))),
        );

        let products = walker(fetcher.clone(), vec![CategoryConfig::new("lacteos", 3)])
            .walk()
            .await
            .unwrap();

        assert_eq!(names(&products), vec!["Leche", "Yogurt"]);
        assert_eq!(fetcher.requested().len(), 3);
    }

    #[tokio::test]
    async fn other_fetch_errors_abort_the_walk() {
        let fetcher = Arc::new(
            CannedFetcher::default()
                .page(&url("lacteos", 1), Page::Html(card("Leche", "$990")))
                .page(&url("lacteos", 2), Page::Broken)
                .page(&url("lacteos", 3), Page::Html(card("Yogurt", "$450"))),
        );

        let err = walker(fetcher.clone(), vec![CategoryConfig::new("lacteos", 3)])
            .walk()
            .await
            .unwrap_err();

        assert_eq!(err.category, "lacteos");
        assert_eq!(err.page, 2);
        assert!(!err.source.is_not_found());
        assert_eq!(fetcher.requested(), vec![url("lacteos", 1), url("lacteos", 2)]);
    }

    #[tokio::test]
    async fn follows_configured_category_order() {
        let fetcher = Arc::new(
            CannedFetcher::default()
                .page(&url("mascotas", 1), Page::Html(card("Arena", "$3.990")))
                .page(&url("carniceria", 1), Page::Html(card("Lomo", "$9.990")))
                .page(&url("carniceria", 2), Page::Html(card("Pollo", "$4.990"))),
        );

        let products = walker(
            fetcher.clone(),
            vec![
                CategoryConfig::new("mascotas", 1),
                CategoryConfig::new("carniceria", 2),
            ],
        )
        .walk()
        .await
        .unwrap();

        assert_eq!(names(&products), vec!["Arena", "Lomo", "Pollo"]);
        assert_eq!(products[0].category, "mascotas");
        assert_eq!(products[2].original_price, 4990);
        assert_eq!(
            fetcher.requested(),
            vec![url("mascotas", 1), url("carniceria", 1), url("carniceria", 2)]
        );
    }

    #[tokio::test]
    async fn empty_category_list_scrapes_nothing() {
        let fetcher = Arc::new(CannedFetcher::default());
        let products = walker(fetcher.clone(), Vec::new()).walk().await.unwrap();

        assert!(products.is_empty());
        assert!(fetcher.requested().is_empty());
    }
}
