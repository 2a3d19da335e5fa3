//! Postgres-backed catalog store.
//!
//! Only the stock slice of a catalog entry lives here: key, display name,
//! quantity and availability. Price, category and owner belong to the wider
//! catalog and are never read or written by this store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | PoolClosed, Io, PoolTimedOut | `Unavailable` |
//! | Database, decode and anything else | `Backend` |
//!
//! ## Runtime
//!
//! [`CatalogStore`] is synchronous. Calls are bridged onto the ambient tokio
//! runtime with `block_in_place`, so they must come from a multi-threaded
//! runtime (the API server runs one).

use std::sync::Arc;

use sqlx::{PgPool, Row};
use tracing::instrument;

use praja_core::ProductKey;
use praja_stock::ProductRecord;

use super::{CatalogStore, StoreError};

/// DDL for the stock slice of the catalog.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS catalog_stock (
    product_key TEXT PRIMARY KEY,
    name        TEXT    NOT NULL,
    quantity    BIGINT  NOT NULL CHECK (quantity >= 0),
    available   BOOLEAN NOT NULL
)
"#;

#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: Arc<PgPool>,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect to `url` and make sure the table exists.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn fetch_all(&self) -> Result<Vec<ProductRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT product_key, name, quantity, available
            FROM catalog_stock
            ORDER BY product_key ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_all", e))?;

        rows.iter().map(record_from_row).collect()
    }

    #[instrument(skip(self, key), fields(key = %key), err)]
    pub async fn fetch(&self, key: &ProductKey) -> Result<Option<ProductRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT product_key, name, quantity, available
            FROM catalog_stock
            WHERE product_key = $1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get", e))?;

        row.as_ref().map(record_from_row).transpose()
    }

    #[instrument(skip(self, record), fields(key = %record.key()), err)]
    pub async fn upsert(&self, record: &ProductRecord) -> Result<(), StoreError> {
        let quantity = i64::try_from(record.quantity())
            .map_err(|_| StoreError::Backend(format!("quantity {} exceeds BIGINT", record.quantity())))?;

        sqlx::query(
            r#"
            INSERT INTO catalog_stock (product_key, name, quantity, available)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (product_key)
            DO UPDATE SET name = EXCLUDED.name,
                          quantity = EXCLUDED.quantity,
                          available = EXCLUDED.available
            "#,
        )
        .bind(record.key().as_str())
        .bind(record.name())
        .bind(quantity)
        .bind(record.available())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("put", e))?;
        Ok(())
    }

    #[instrument(skip(self, key), fields(key = %key), err)]
    pub async fn remove(&self, key: &ProductKey) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM catalog_stock WHERE product_key = $1")
            .bind(key.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;
        Ok(result.rows_affected() > 0)
    }
}

fn record_from_row(row: &sqlx::postgres::PgRow) -> Result<ProductRecord, StoreError> {
    let key: String = row.try_get("product_key").map_err(|e| map_sqlx_error("decode", e))?;
    let name: String = row.try_get("name").map_err(|e| map_sqlx_error("decode", e))?;
    let quantity: i64 = row.try_get("quantity").map_err(|e| map_sqlx_error("decode", e))?;
    let available: bool = row.try_get("available").map_err(|e| map_sqlx_error("decode", e))?;

    Ok(ProductRecord::from_snapshot(
        ProductKey::from(key),
        name,
        quantity.max(0) as u64,
        available,
    ))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool unavailable in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {operation}: {e}")),
        sqlx::Error::Database(db_err) => {
            StoreError::Backend(format!("database error in {operation}: {}", db_err.message()))
        }
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}

fn block_on<F, T>(fut: F) -> Result<T, StoreError>
where
    F: std::future::Future<Output = Result<T, StoreError>>,
{
    let handle = tokio::runtime::Handle::try_current().map_err(|_| {
        StoreError::Unavailable(
            "PostgresCatalogStore requires a tokio runtime; call it from within one".to_string(),
        )
    })?;
    tokio::task::block_in_place(|| handle.block_on(fut))
}

impl CatalogStore for PostgresCatalogStore {
    fn load_all(&self) -> Result<Vec<ProductRecord>, StoreError> {
        block_on(self.fetch_all())
    }

    fn get(&self, key: &ProductKey) -> Result<Option<ProductRecord>, StoreError> {
        block_on(self.fetch(key))
    }

    fn put(&self, record: ProductRecord) -> Result<(), StoreError> {
        block_on(self.upsert(&record))
    }

    fn delete(&self, key: &ProductKey) -> Result<bool, StoreError> {
        block_on(self.remove(key))
    }
}
