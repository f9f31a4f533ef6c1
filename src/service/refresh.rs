use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{DeletionError, RefreshError, RefreshStage};
use crate::models::Product;
use crate::scrapers::CategoryWalker;
use crate::storage::ProductStore;

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Counts from a completed refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub deleted: usize,
    pub scraped: usize,
    pub inserted: usize,
}

/// Replaces the whole product store with a fresh scrape: delete everything,
/// scrape, insert everything. A failed stage stops the refresh and leaves the
/// store as it is.
pub struct DatasetReplacer {
    store: Arc<dyn ProductStore>,
    walker: CategoryWalker,
    timestamp_format: String,
}

impl DatasetReplacer {
    pub fn new(store: Arc<dyn ProductStore>, walker: CategoryWalker) -> Self {
        Self {
            store,
            walker,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }

    pub fn with_timestamp_format(mut self, format: &str) -> Self {
        self.timestamp_format = format.to_string();
        self
    }

    /// Run one full refresh. `Ok(true)` means every stage completed.
    pub async fn refresh(&self) -> Result<bool, RefreshError> {
        match self.run().await {
            Ok(summary) => {
                info!(
                    "[{}] Refresh finished: {} deleted, {} scraped, {} inserted",
                    RefreshStage::Done,
                    summary.deleted,
                    summary.scraped,
                    summary.inserted
                );
                Ok(true)
            }
            Err(e) => {
                error!("[{}] Refresh aborted while {}: {}", RefreshStage::Failed, e.stage(), e);
                Err(e)
            }
        }
    }

    /// Same as [`DatasetReplacer::refresh`] but returns the stage counts.
    pub async fn run(&self) -> Result<RefreshSummary, RefreshError> {
        info!("[{}] Starting refresh", RefreshStage::Idle);

        info!("[{}] Removing existing products", RefreshStage::Deleting);
        let deleted = self.delete_all().await?;

        info!(
            "[{}] Scraping {} categories",
            RefreshStage::Scraping,
            self.walker.categories().len()
        );
        let products = self.walker.walk().await?;
        let scraped = products.len();

        info!("[{}] Storing {} products", RefreshStage::Inserting, scraped);
        let inserted = self.insert_all(&products).await?;

        Ok(RefreshSummary {
            deleted,
            scraped,
            inserted,
        })
    }

    async fn delete_all(&self) -> Result<usize, DeletionError> {
        let existing = self.store.scan_all().await.map_err(DeletionError::Scan)?;
        if existing.is_empty() {
            info!("No products to delete");
            return Ok(0);
        }

        let total = existing.len();
        let mut failed = 0;
        let mut first_error = None;

        for product in &existing {
            if let Err(e) = self.store.delete(&product.product_id).await {
                warn!("Could not delete product {}: {}", product.product_id, e);
                failed += 1;
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(first) => Err(DeletionError::Partial {
                failed,
                total,
                first,
            }),
            None => Ok(total),
        }
    }

    async fn insert_all(&self, products: &[Product]) -> Result<usize, RefreshError> {
        let timestamp = Utc::now().format(&self.timestamp_format).to_string();
        let total = products.len();

        for (inserted, product) in products.iter().enumerate() {
            let record = product.stamped(&timestamp);
            if let Err(source) = self.store.put(&record).await {
                return Err(RefreshError::Insert {
                    product_id: record.product_id.to_string(),
                    inserted,
                    total,
                    source,
                });
            }
        }

        Ok(total)
    }
}
