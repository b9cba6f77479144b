//! Postgres-backed store.
//!
//! The atomic commit maps directly onto a database transaction: the product
//! update (guarded by a version compare-and-swap in the WHERE clause) and the
//! ledger insert either both commit or both roll back.
//!
//! SQLx errors are mapped to `DomainError` as follows: unique violations
//! (`23505`, product name/SKU) become `DuplicateKey`; everything else becomes
//! `Persistence`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::instrument;
use uuid::Uuid;

use stockledger_core::{DomainError, DomainResult, ProductId, TransactionId};
use stockledger_ledger::{
    LedgerEntry, ProductStore, StockStore, TransactionKind, TransactionRecord, TransactionStore,
};
use stockledger_products::Product;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    id UUID PRIMARY KEY,
    sku TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL,
    category TEXT NOT NULL,
    unit_price BIGINT NOT NULL CHECK (unit_price >= 0),
    stock BIGINT NOT NULL CHECK (stock >= 0),
    low_stock_threshold BIGINT NOT NULL CHECK (low_stock_threshold >= 0),
    version BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS transactions (
    id UUID PRIMARY KEY,
    product_id UUID NOT NULL,
    kind TEXT NOT NULL CHECK (kind IN ('sale', 'restock')),
    quantity BIGINT NOT NULL CHECK (quantity >= 1),
    unit_price_at_transaction BIGINT NOT NULL CHECK (unit_price_at_transaction >= 0),
    recorded_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS transactions_recorded_at_idx
    ON transactions (recorded_at DESC);
"#;

/// Postgres implementation of the store traits.
///
/// Thread-safe via the SQLx connection pool. No row is ever updated or
/// deleted in `transactions`; products carry a `version` column for
/// optimistic concurrency.
#[derive(Debug, Clone)]
pub struct PgStockStore {
    pool: Arc<PgPool>,
}

impl PgStockStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect and make sure the schema exists.
    pub async fn connect(database_url: &str, max_connections: u32) -> DomainResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> DomainResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

#[async_trait]
impl ProductStore for PgStockStore {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn get(&self, id: ProductId) -> DomainResult<Product> {
        let row = sqlx::query(
            "SELECT id, sku, name, description, category, unit_price, stock, \
             low_stock_threshold, version, created_at, updated_at \
             FROM products WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get", e))?;

        match row {
            Some(row) => product_from_row(&row, ""),
            None => Err(DomainError::NotFound),
        }
    }

    async fn list(&self) -> DomainResult<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT id, sku, name, description, category, unit_price, stock, \
             low_stock_threshold, version, created_at, updated_at \
             FROM products ORDER BY name ASC",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list", e))?;

        rows.iter().map(|row| product_from_row(row, "")).collect()
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn insert(&self, product: Product) -> DomainResult<Product> {
        sqlx::query(
            "INSERT INTO products \
             (id, sku, name, description, category, unit_price, stock, \
              low_stock_threshold, version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(product.id.as_uuid())
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.unit_price as i64)
        .bind(product.stock)
        .bind(product.low_stock_threshold)
        .bind(product.version as i64)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert", e))?;

        Ok(product)
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn update(&self, mut product: Product) -> DomainResult<Product> {
        let result = sqlx::query(
            "UPDATE products SET sku = $1, name = $2, description = $3, category = $4, \
             unit_price = $5, stock = $6, low_stock_threshold = $7, \
             version = version + 1, updated_at = $8 \
             WHERE id = $9",
        )
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.unit_price as i64)
        .bind(product.stock)
        .bind(product.low_stock_threshold)
        .bind(product.updated_at)
        .bind(product.id.as_uuid())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        product.version += 1;
        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete(&self, id: ProductId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionStore for PgStockStore {
    async fn list_all(&self) -> DomainResult<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            "SELECT t.id, t.product_id, t.kind, t.quantity, t.unit_price_at_transaction, \
             t.recorded_at, \
             p.id AS p_id, p.sku AS p_sku, p.name AS p_name, p.description AS p_description, \
             p.category AS p_category, p.unit_price AS p_unit_price, p.stock AS p_stock, \
             p.low_stock_threshold AS p_low_stock_threshold, p.version AS p_version, \
             p.created_at AS p_created_at, p.updated_at AS p_updated_at \
             FROM transactions t \
             LEFT JOIN products p ON p.id = t.product_id \
             ORDER BY t.recorded_at DESC",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_all", e))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            let record = record_from_row(row)?;
            // LEFT JOIN: a deleted product resolves to NULL columns.
            let product = match row
                .try_get::<Option<Uuid>, _>("p_id")
                .map_err(|e| map_sqlx_error("list_all", e))?
            {
                Some(_) => Some(product_from_row(row, "p_")?),
                None => None,
            };
            entries.push(LedgerEntry { record, product });
        }
        Ok(entries)
    }
}

#[async_trait]
impl StockStore for PgStockStore {
    #[instrument(skip(self, record, product), fields(product_id = %product.id, transaction_id = %record.id))]
    async fn commit(
        &self,
        record: TransactionRecord,
        mut product: Product,
    ) -> DomainResult<(TransactionRecord, Product)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("commit/begin", e))?;

        let updated = sqlx::query(
            "UPDATE products SET stock = $1, updated_at = $2, version = version + 1 \
             WHERE id = $3 AND version = $4",
        )
        .bind(product.stock)
        .bind(product.updated_at)
        .bind(product.id.as_uuid())
        .bind(product.version as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("commit/update", e))?;

        if updated.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("commit/rollback", e))?;

            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
                    .bind(product.id.as_uuid())
                    .fetch_one(&*self.pool)
                    .await
                    .map_err(|e| map_sqlx_error("commit/exists", e))?;

            return Err(if exists {
                DomainError::conflict("stale product version")
            } else {
                DomainError::NotFound
            });
        }

        sqlx::query(
            "INSERT INTO transactions \
             (id, product_id, kind, quantity, unit_price_at_transaction, recorded_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.id.as_uuid())
        .bind(record.product_id.as_uuid())
        .bind(record.kind.as_str())
        .bind(record.quantity)
        .bind(record.unit_price_at_transaction as i64)
        .bind(record.recorded_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("commit/insert", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;

        product.version += 1;
        Ok((record, product))
    }
}

fn product_from_row(row: &PgRow, prefix: &str) -> DomainResult<Product> {
    let col = |name: &str| format!("{prefix}{name}");
    let get_i64 = |name: &str| -> DomainResult<i64> {
        row.try_get::<i64, _>(col(name).as_str())
            .map_err(|e| DomainError::persistence(format!("column {name}: {e}")))
    };

    Ok(Product {
        id: ProductId::from_uuid(
            row.try_get::<Uuid, _>(col("id").as_str())
                .map_err(|e| DomainError::persistence(format!("column id: {e}")))?,
        ),
        sku: row
            .try_get::<String, _>(col("sku").as_str())
            .map_err(|e| DomainError::persistence(format!("column sku: {e}")))?,
        name: row
            .try_get::<String, _>(col("name").as_str())
            .map_err(|e| DomainError::persistence(format!("column name: {e}")))?,
        description: row
            .try_get::<String, _>(col("description").as_str())
            .map_err(|e| DomainError::persistence(format!("column description: {e}")))?,
        category: row
            .try_get::<String, _>(col("category").as_str())
            .map_err(|e| DomainError::persistence(format!("column category: {e}")))?,
        unit_price: get_i64("unit_price")? as u64,
        stock: get_i64("stock")?,
        low_stock_threshold: get_i64("low_stock_threshold")?,
        version: get_i64("version")? as u64,
        created_at: row
            .try_get::<DateTime<Utc>, _>(col("created_at").as_str())
            .map_err(|e| DomainError::persistence(format!("column created_at: {e}")))?,
        updated_at: row
            .try_get::<DateTime<Utc>, _>(col("updated_at").as_str())
            .map_err(|e| DomainError::persistence(format!("column updated_at: {e}")))?,
    })
}

fn record_from_row(row: &PgRow) -> DomainResult<TransactionRecord> {
    let kind: String = row
        .try_get("kind")
        .map_err(|e| DomainError::persistence(format!("column kind: {e}")))?;
    let kind: TransactionKind = kind
        .parse()
        .map_err(|_| DomainError::persistence(format!("corrupt transaction kind '{kind}'")))?;

    Ok(TransactionRecord {
        id: TransactionId::from_uuid(
            row.try_get::<Uuid, _>("id")
                .map_err(|e| DomainError::persistence(format!("column id: {e}")))?,
        ),
        product_id: ProductId::from_uuid(
            row.try_get::<Uuid, _>("product_id")
                .map_err(|e| DomainError::persistence(format!("column product_id: {e}")))?,
        ),
        kind,
        quantity: row
            .try_get::<i64, _>("quantity")
            .map_err(|e| DomainError::persistence(format!("column quantity: {e}")))?,
        unit_price_at_transaction: row
            .try_get::<i64, _>("unit_price_at_transaction")
            .map_err(|e| DomainError::persistence(format!("column unit_price_at_transaction: {e}")))?
            as u64,
        recorded_at: row
            .try_get::<DateTime<Utc>, _>("recorded_at")
            .map_err(|e| DomainError::persistence(format!("column recorded_at: {e}")))?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(ref db) = err {
        if db.code().as_deref() == Some("23505") {
            return DomainError::duplicate_key(db.message().to_string());
        }
    }
    DomainError::persistence(format!("{operation}: {err}"))
}
