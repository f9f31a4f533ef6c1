/// Text pulled out of one listing card before any price normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawListing {
    pub name: String,
    pub category: String,
    pub original_price_text: String,
    /// Empty when the card shows a single, non-discounted price.
    pub discounted_price_text: String,
}
