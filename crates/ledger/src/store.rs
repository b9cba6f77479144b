//! Store interfaces consumed by the ledger engine.
//!
//! The engine makes no storage assumptions: implementations range from the
//! in-memory store (tests/dev) to Postgres (production). What every
//! implementation must provide is transactional composability between the
//! product table and the ledger: `StockStore::commit` persists a record and
//! the adjusted product as one atomic unit, or not at all.

use std::sync::Arc;

use async_trait::async_trait;

use stockledger_core::{DomainResult, ProductId};
use stockledger_products::Product;

use crate::record::{LedgerEntry, TransactionRecord};

/// Product persistence.
///
/// Implementations enforce uniqueness of `name` and `sku` at the storage
/// layer, surfaced as `DomainError::DuplicateKey`.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Fetch a product by id (`NotFound` when absent).
    async fn get(&self, id: ProductId) -> DomainResult<Product>;

    /// All products, ordered by name ascending.
    async fn list(&self) -> DomainResult<Vec<Product>>;

    /// Persist a new product (`DuplicateKey` on name/SKU collision).
    async fn insert(&self, product: Product) -> DomainResult<Product>;

    /// Overwrite an existing product (`NotFound` when absent). Bumps the
    /// version on success. Used by the administrative update path only; stock
    /// movements go through `StockStore::commit`.
    async fn update(&self, product: Product) -> DomainResult<Product>;

    /// Remove a product. Ledger records referencing it are kept and dangle.
    async fn delete(&self, id: ProductId) -> DomainResult<()>;
}

/// Read side of the append-only ledger. Records are never updated or deleted.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// All ledger entries, newest first, each with its referenced product
    /// resolved if still present.
    async fn list_all(&self) -> DomainResult<Vec<LedgerEntry>>;
}

/// Combined store with the atomic record-plus-product commit.
#[async_trait]
pub trait StockStore: ProductStore + TransactionStore {
    /// Atomically append `record` and persist `product` with its stock
    /// already adjusted.
    ///
    /// Implementations must:
    /// - compare-and-swap on `product.version` against the stored row and
    ///   fail with `Conflict` on a mismatch, writing nothing
    /// - persist both rows or neither (`Persistence` on failure)
    /// - bump the product version on success
    async fn commit(
        &self,
        record: TransactionRecord,
        product: Product,
    ) -> DomainResult<(TransactionRecord, Product)>;
}

#[async_trait]
impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    async fn get(&self, id: ProductId) -> DomainResult<Product> {
        (**self).get(id).await
    }

    async fn list(&self) -> DomainResult<Vec<Product>> {
        (**self).list().await
    }

    async fn insert(&self, product: Product) -> DomainResult<Product> {
        (**self).insert(product).await
    }

    async fn update(&self, product: Product) -> DomainResult<Product> {
        (**self).update(product).await
    }

    async fn delete(&self, id: ProductId) -> DomainResult<()> {
        (**self).delete(id).await
    }
}

#[async_trait]
impl<S> TransactionStore for Arc<S>
where
    S: TransactionStore + ?Sized,
{
    async fn list_all(&self) -> DomainResult<Vec<LedgerEntry>> {
        (**self).list_all().await
    }
}

#[async_trait]
impl<S> StockStore for Arc<S>
where
    S: StockStore + ?Sized,
{
    async fn commit(
        &self,
        record: TransactionRecord,
        product: Product,
    ) -> DomainResult<(TransactionRecord, Product)> {
        (**self).commit(record, product).await
    }
}
