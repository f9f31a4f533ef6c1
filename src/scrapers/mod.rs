use async_trait::async_trait;

use crate::error::FetchError;

mod listing;
mod walker;

pub use listing::{expand_listing, extract_listings, ListingExtractor};
pub use walker::{CategoryWalker, PageUrl};

/// Source of listing page HTML.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one page. Pages that do not exist must be reported as
    /// [`FetchError::NotFound`].
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}
