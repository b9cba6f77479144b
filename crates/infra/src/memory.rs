//! In-memory store (tests/dev).
//!
//! A single `RwLock` guards both the product map and the ledger vector, so a
//! `commit` is a plain critical section: the record append and the product
//! write become visible together or not at all.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use stockledger_core::{DomainError, DomainResult, ProductId};
use stockledger_ledger::{LedgerEntry, ProductStore, StockStore, TransactionRecord, TransactionStore};
use stockledger_products::Product;

#[derive(Debug, Default)]
struct Inner {
    products: HashMap<ProductId, Product>,
    /// Append-only, insertion-ordered (chronological) ledger.
    ledger: Vec<TransactionRecord>,
}

/// Map-backed implementation of the store traits.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    inner: RwLock<Inner>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn check_unique(&self, candidate: &Product) -> DomainResult<()> {
        for existing in self.products.values() {
            if existing.id == candidate.id {
                continue;
            }
            if existing.name == candidate.name {
                return Err(DomainError::duplicate_key(format!(
                    "product name '{}' already exists",
                    candidate.name
                )));
            }
            if existing.sku == candidate.sku {
                return Err(DomainError::duplicate_key(format!(
                    "SKU '{}' already exists",
                    candidate.sku
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ProductStore for InMemoryStockStore {
    async fn get(&self, id: ProductId) -> DomainResult<Product> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.products.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    async fn list(&self) -> DomainResult<Vec<Product>> {
        let inner = self.inner.read().expect("store lock poisoned");
        let mut products: Vec<Product> = inner.products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn insert(&self, product: Product) -> DomainResult<Product> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.check_unique(&product)?;
        inner.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update(&self, mut product: Product) -> DomainResult<Product> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        if !inner.products.contains_key(&product.id) {
            return Err(DomainError::NotFound);
        }
        inner.check_unique(&product)?;
        product.version += 1;
        inner.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn delete(&self, id: ProductId) -> DomainResult<()> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        match inner.products.remove(&id) {
            Some(_) => Ok(()),
            None => Err(DomainError::NotFound),
        }
    }
}

#[async_trait]
impl TransactionStore for InMemoryStockStore {
    async fn list_all(&self) -> DomainResult<Vec<LedgerEntry>> {
        let inner = self.inner.read().expect("store lock poisoned");
        // The vector is chronological; walk it backwards for newest-first.
        Ok(inner
            .ledger
            .iter()
            .rev()
            .map(|record| LedgerEntry {
                record: record.clone(),
                product: inner.products.get(&record.product_id).cloned(),
            })
            .collect())
    }
}

#[async_trait]
impl StockStore for InMemoryStockStore {
    async fn commit(
        &self,
        record: TransactionRecord,
        mut product: Product,
    ) -> DomainResult<(TransactionRecord, Product)> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let current = inner
            .products
            .get(&product.id)
            .ok_or(DomainError::NotFound)?;
        if current.version != product.version {
            return Err(DomainError::conflict("stale product version"));
        }
        product.version += 1;
        inner.ledger.push(record.clone());
        inner.products.insert(product.id, product.clone());
        Ok((record, product))
    }
}

#[cfg(test)]
mod tests {
    use stockledger_ledger::TransactionKind;
    use stockledger_products::NewProduct;

    use super::*;

    fn product(name: &str, sku: &str, stock: i64) -> Product {
        Product::create(NewProduct {
            name: name.to_string(),
            sku: Some(sku.to_string()),
            description: None,
            category: None,
            unit_price: 500,
            stock,
            low_stock_threshold: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn insert_enforces_name_and_sku_uniqueness() {
        let store = InMemoryStockStore::new();
        store.insert(product("Widget", "SKU-A", 0)).await.unwrap();

        let err = store.insert(product("Widget", "SKU-B", 0)).await.unwrap_err();
        assert!(matches!(err, DomainError::DuplicateKey(_)));

        let err = store.insert(product("Gadget", "SKU-A", 0)).await.unwrap_err();
        assert!(matches!(err, DomainError::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn update_rejects_renaming_onto_existing_product() {
        let store = InMemoryStockStore::new();
        store.insert(product("Widget", "SKU-A", 0)).await.unwrap();
        let mut other = store.insert(product("Gadget", "SKU-B", 0)).await.unwrap();

        other.name = "Widget".to_string();
        let err = store.update(other).await.unwrap_err();
        assert!(matches!(err, DomainError::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn list_is_sorted_by_name() {
        let store = InMemoryStockStore::new();
        store.insert(product("Zebra", "SKU-Z", 0)).await.unwrap();
        store.insert(product("Apple", "SKU-A", 0)).await.unwrap();

        let names: Vec<String> = store.list().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Apple".to_string(), "Zebra".to_string()]);
    }

    #[tokio::test]
    async fn commit_rejects_stale_versions_without_writing() {
        let store = InMemoryStockStore::new();
        let stored = store.insert(product("Widget", "SKU-A", 10)).await.unwrap();

        let mut stale = stored.clone();
        stale.version = stored.version + 7;
        stale.stock = 4;
        let record = TransactionRecord::new(stored.id, TransactionKind::Sale, 6, stored.unit_price);

        let err = store.commit(record, stale).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(store.get(stored.id).await.unwrap().stock, 10);
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ledger_entries_are_newest_first_and_tolerate_dangling_products() {
        let store = InMemoryStockStore::new();
        let stored = store.insert(product("Widget", "SKU-A", 10)).await.unwrap();

        let first = TransactionRecord::new(stored.id, TransactionKind::Sale, 1, 500);
        let mut after_first = stored.clone();
        after_first.stock = 9;
        let (_, committed) = store.commit(first, after_first).await.unwrap();

        let second = TransactionRecord::new(stored.id, TransactionKind::Sale, 2, 500);
        let mut after_second = committed.clone();
        after_second.stock = 7;
        store.commit(second, after_second).await.unwrap();

        let entries = store.list_all().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].record.quantity, 2);
        assert_eq!(entries[1].record.quantity, 1);
        assert!(entries.iter().all(|e| e.product.is_some()));

        // Deleting the product leaves the ledger intact with dangling refs.
        store.delete(stored.id).await.unwrap();
        let entries = store.list_all().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.product.is_none()));
    }
}
