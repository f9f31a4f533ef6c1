use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{Product, ProductId};

mod sqlite;
pub use sqlite::SqliteStorage;

/// Key-value product store. Each call is atomic on its own; nothing spans
/// several records.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn migrate(&self) -> Result<(), StoreError>;
    async fn scan_all(&self) -> Result<Vec<Product>, StoreError>;
    async fn get(&self, id: &ProductId) -> Result<Option<Product>, StoreError>;
    /// Insert or replace the record with the same id.
    async fn put(&self, product: &Product) -> Result<(), StoreError>;
    async fn delete(&self, id: &ProductId) -> Result<(), StoreError>;
}
