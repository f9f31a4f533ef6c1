use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// NewType pattern for type safety
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn generate() -> Self {
        ProductId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        ProductId(value.to_string())
    }
}

/// One scraped product. `product_id` and `last_updated` stay empty until the
/// record is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    pub original_price: u64,
    pub discounted_price: u64,
    pub last_updated: String,
}

impl Product {
    pub fn new(name: &str, category: &str, original_price: u64, discounted_price: u64) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            original_price,
            discounted_price,
            ..Default::default()
        }
    }

    /// Same product stamped with a fresh id and the given timestamp.
    pub fn stamped(&self, last_updated: &str) -> Self {
        Self {
            product_id: ProductId::generate(),
            last_updated: last_updated.to_string(),
            ..self.clone()
        }
    }

    /// Identity of a product ignoring the generated id and timestamp.
    pub fn logical_key(&self) -> (&str, &str, u64, u64) {
        (
            &self.name,
            &self.category,
            self.original_price,
            self.discounted_price,
        )
    }
}
