use std::sync::Arc;
use tracing::error;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{Product, ProductId};
use crate::storage::ProductStore;

/// Read access to the stored catalog.
pub struct ProductCatalog {
    store: Arc<dyn ProductStore>,
}

impl ProductCatalog {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    /// Every stored product, ordered by category and then name.
    pub async fn list(&self) -> ServiceResult<Vec<Product>> {
        let mut products = self.store.scan_all().await.map_err(|e| {
            error!("Error listing products: {}", e);
            ServiceError::from(e)
        })?;

        products.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.original_price.cmp(&b.original_price))
                .then_with(|| a.discounted_price.cmp(&b.discounted_price))
        });
        Ok(products)
    }

    pub async fn get(&self, id: &ProductId) -> ServiceResult<Product> {
        match self.store.get(id).await {
            Ok(Some(product)) => Ok(product),
            Ok(None) => Err(ServiceError::NotFound(id.to_string())),
            Err(e) => {
                error!("Error getting product {}: {}", id, e);
                Err(e.into())
            }
        }
    }
}
