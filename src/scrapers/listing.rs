use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::warn;

use crate::models::{Product, RawListing};
use crate::parsers::{clean_text, select_texts, PriceOutcome, PriceParser};

struct CardSelectors {
    card: Selector,
    name: Selector,
    category: Selector,
    original_price: Selector,
    discounted_price: Selector,
    any_price: Selector,
}

static SELECTORS: Lazy<CardSelectors> = Lazy::new(|| CardSelectors {
    card: Selector::parse(".product-small.box").expect("Invalid card selector"),
    name: Selector::parse(".name.product-title a").expect("Invalid name selector"),
    category: Selector::parse(".category").expect("Invalid category selector"),
    original_price: Selector::parse(".price del .woocommerce-Price-amount.amount")
        .expect("Invalid original price selector"),
    discounted_price: Selector::parse(".price ins .woocommerce-Price-amount.amount")
        .expect("Invalid discounted price selector"),
    any_price: Selector::parse(".price .woocommerce-Price-amount.amount")
        .expect("Invalid price selector"),
});

/// Separator used when a price field is rendered as several amount nodes.
const RANGE_JOINER: &str = " \u{2013} ";

/// Turns listing page HTML into products.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListingExtractor {
    parser: PriceParser,
}

impl ListingExtractor {
    pub fn new(parser: PriceParser) -> Self {
        Self { parser }
    }

    /// Read every listing card on a page. Cards without a discounted price
    /// report their single visible price as the original price.
    pub fn extract(&self, html: &str) -> Vec<RawListing> {
        let document = Html::parse_document(html);
        let selectors = &*SELECTORS;

        document
            .select(&selectors.card)
            .map(|card| {
                let name = card
                    .select(&selectors.name)
                    .next()
                    .map(|node| clean_text(&node.text().collect::<String>()))
                    .unwrap_or_default();
                let category = select_texts(&card, &selectors.category).join(" ");

                let discounted = select_texts(&card, &selectors.discounted_price);
                let original = if discounted.is_empty() {
                    select_texts(&card, &selectors.any_price)
                } else {
                    select_texts(&card, &selectors.original_price)
                };

                RawListing {
                    name,
                    category,
                    original_price_text: original.join(RANGE_JOINER),
                    discounted_price_text: discounted.join(RANGE_JOINER),
                }
            })
            .collect()
    }

    /// Expand one listing into a product per (original, discounted) price pair.
    pub fn expand(&self, listing: &RawListing, fallback_category: &str) -> Vec<Product> {
        let category = if listing.category.is_empty() {
            fallback_category
        } else {
            listing.category.as_str()
        };

        let original_prices = self.candidates(&listing.original_price_text, "original", listing);
        let discounted_prices = self.candidates(&listing.discounted_price_text, "discounted", listing);

        let mut products = Vec::with_capacity(original_prices.len() * discounted_prices.len());
        for &original_price in &original_prices {
            for &discounted_price in &discounted_prices {
                products.push(Product::new(
                    &listing.name,
                    category,
                    original_price,
                    discounted_price,
                ));
            }
        }

        products
    }

    /// Extract and expand a whole page.
    pub fn products(&self, html: &str, fallback_category: &str) -> Vec<Product> {
        self.extract(html)
            .iter()
            .flat_map(|listing| self.expand(listing, fallback_category))
            .collect()
    }

    fn candidates(&self, text: &str, field: &str, listing: &RawListing) -> Vec<u64> {
        let outcome = self.parser.parse_or_default(text);
        if let PriceOutcome::Degraded(ref e) = outcome {
            // A missing discount is the normal case for non-promotional cards.
            if !(field == "discounted" && text.is_empty()) {
                warn!("Using 0 for {} price of {:?}: {}", field, listing.name, e);
            }
        }
        outcome.candidates()
    }
}

pub fn extract_listings(html: &str) -> Vec<RawListing> {
    ListingExtractor::default().extract(html)
}

pub fn expand_listing(listing: &RawListing, fallback_category: &str) -> Vec<Product> {
    ListingExtractor::default().expand(listing, fallback_category)
}
