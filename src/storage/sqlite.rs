use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

use crate::error::StoreError;
use crate::models::{Product, ProductId};
use crate::storage::ProductStore;

pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

/// Raw column values, converted to a [`Product`] outside the row callback.
struct ProductRow {
    product_id: String,
    name: String,
    category: String,
    original_price: i64,
    discounted_price: i64,
    last_updated: String,
}

impl ProductRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            product_id: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
            original_price: row.get(3)?,
            discounted_price: row.get(4)?,
            last_updated: row.get(5)?,
        })
    }

    fn into_product(self) -> Result<Product, StoreError> {
        Ok(Product {
            product_id: ProductId(self.product_id),
            name: self.name,
            category: self.category,
            original_price: from_column("original_price", self.original_price)?,
            discounted_price: from_column("discounted_price", self.discounted_price)?,
            last_updated: self.last_updated,
        })
    }
}

fn from_column(field: &'static str, value: i64) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::OutOfRange {
        field,
        value: value.to_string(),
    })
}

fn to_column(field: &'static str, value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::OutOfRange {
        field,
        value: value.to_string(),
    })
}

const SELECT_COLUMNS: &str =
    "SELECT product_id, name, category, original_price, discounted_price, last_updated FROM products";

impl SqliteStorage {
    pub async fn new(db_path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub async fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

#[async_trait]
impl ProductStore for SqliteStorage {
    async fn migrate(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS products (
                product_id TEXT PRIMARY KEY NOT NULL,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                original_price INTEGER NOT NULL,
                discounted_price INTEGER NOT NULL,
                last_updated TEXT NOT NULL
            )",
            [],
        )?;

        info!("Database migration completed");
        Ok(())
    }

    async fn scan_all(&self) -> Result<Vec<Product>, StoreError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!("{} ORDER BY rowid", SELECT_COLUMNS))?;
        let rows = stmt
            .query_map([], ProductRow::read)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(ProductRow::into_product).collect()
    }

    async fn get(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let conn = self.lock()?;

        let row = conn
            .query_row(
                &format!("{} WHERE product_id = ?1", SELECT_COLUMNS),
                params![id.as_str()],
                ProductRow::read,
            )
            .optional()?;

        row.map(ProductRow::into_product).transpose()
    }

    async fn put(&self, product: &Product) -> Result<(), StoreError> {
        let original_price = to_column("original_price", product.original_price)?;
        let discounted_price = to_column("discounted_price", product.discounted_price)?;
        let conn = self.lock()?;

        conn.execute(
            "INSERT OR REPLACE INTO products
                (product_id, name, category, original_price, discounted_price, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                product.product_id.as_str(),
                product.name,
                product.category,
                original_price,
                discounted_price,
                product.last_updated,
            ],
        )?;

        Ok(())
    }

    async fn delete(&self, id: &ProductId) -> Result<(), StoreError> {
        let conn = self.lock()?;

        conn.execute("DELETE FROM products WHERE product_id = ?1", params![id.as_str()])?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn storage() -> SqliteStorage {
        let storage = SqliteStorage::in_memory().await.unwrap();
        storage.migrate().await.unwrap();
        storage
    }

    fn product(id: &str, name: &str) -> Product {
        Product {
            product_id: ProductId::from(id),
            last_updated: "2024-05-01T12:00:00Z".to_string(),
            ..Product::new(name, "despensa", 2590, 1990)
        }
    }

    #[tokio::test]
    async fn put_get_and_scan() {
        let storage = storage().await;
        storage.put(&product("a", "Arroz")).await.unwrap();
        storage.put(&product("b", "Fideos")).await.unwrap();

        assert_eq!(
            storage.get(&ProductId::from("a")).await.unwrap(),
            Some(product("a", "Arroz"))
        );
        assert_eq!(storage.get(&ProductId::from("missing")).await.unwrap(), None);
        assert_eq!(
            storage.scan_all().await.unwrap(),
            vec![product("a", "Arroz"), product("b", "Fideos")]
        );
    }

    #[tokio::test]
    async fn put_replaces_existing_id() {
        let storage = storage().await;
        storage.put(&product("a", "Arroz")).await.unwrap();
        storage.put(&product("a", "Arroz integral")).await.unwrap();

        let all = storage.scan_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Arroz integral");
    }

    #[tokio::test]
    async fn delete_removes_only_the_given_id() {
        let storage = storage().await;
        storage.put(&product("a", "Arroz")).await.unwrap();
        storage.put(&product("b", "Fideos")).await.unwrap();

        storage.delete(&ProductId::from("a")).await.unwrap();
        // Deleting an absent key is a no-op.
        storage.delete(&ProductId::from("a")).await.unwrap();

        assert_eq!(storage.scan_all().await.unwrap(), vec![product("b", "Fideos")]);
    }

    #[tokio::test]
    async fn rejects_prices_beyond_sqlite_integers() {
        let storage = storage().await;
        let mut huge = product("a", "Arroz");
        huge.original_price = u64::MAX;

        let err = storage.put(&huge).await.unwrap_err();
        assert!(matches!(err, StoreError::OutOfRange { field: "original_price", .. }));
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let storage = storage().await;
        storage.migrate().await.unwrap();
        assert!(storage.scan_all().await.unwrap().is_empty());
    }
}
