use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use stockledger_core::{DomainError, DomainResult, ProductId};
use stockledger_products::Product;

use crate::record::{TransactionKind, TransactionRecord};
use crate::store::StockStore;

/// Engine tuning, passed in at construction (no ambient globals).
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// How many times a stale-version commit is retried whole (reload,
    /// recompute, re-validate) before surfacing `Conflict`.
    pub retry_budget: u32,
    /// Optional upper bound on a product's stock count. Restocks that would
    /// exceed it fail with `CapacityExceeded`. Unbounded when `None` (i64
    /// overflow is still rejected).
    pub max_stock: Option<i64>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            retry_budget: 3,
            max_stock: None,
        }
    }
}

/// Both entities persisted by a successful `apply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerReceipt {
    pub record: TransactionRecord,
    pub product: Product,
}

/// The single mutation path for stock counts.
///
/// `apply` validates the movement, snapshots the product's price into an
/// immutable `TransactionRecord`, and commits record plus adjusted product
/// atomically. Concurrent applies against the same product are serialized by
/// the store's version check; a stale read is retried whole up to the
/// configured budget. Every failure path leaves zero side effects.
///
/// `apply` is not blindly retryable by callers: re-submitting a transaction
/// that already committed double-counts the stock change. At-most-once
/// semantics (idempotency keys) are the caller's responsibility.
#[derive(Clone)]
pub struct LedgerEngine {
    store: Arc<dyn StockStore>,
    config: LedgerConfig,
}

impl LedgerEngine {
    pub fn new(store: Arc<dyn StockStore>, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Record a sale or restock against `product_id`.
    #[instrument(skip(self), fields(product_id = %product_id, kind = %kind, quantity))]
    pub async fn apply(
        &self,
        product_id: ProductId,
        kind: TransactionKind,
        quantity: i64,
    ) -> DomainResult<LedgerReceipt> {
        if quantity < 1 {
            return Err(DomainError::InvalidQuantity(quantity));
        }

        let mut attempts: u32 = 0;
        loop {
            let product = self.store.get(product_id).await?;
            let candidate = self.candidate_stock(&product, kind, quantity)?;

            // Price snapshot is captured here, before any mutation, so later
            // price edits never reach historical records.
            let record = TransactionRecord::new(product_id, kind, quantity, product.unit_price);

            let mut updated = product;
            updated.stock = candidate;
            updated.updated_at = record.recorded_at;

            match self.store.commit(record, updated).await {
                Ok((record, product)) => {
                    tracing::debug!(
                        transaction_id = %record.id,
                        stock = product.stock,
                        "ledger entry committed"
                    );
                    return Ok(LedgerReceipt { record, product });
                }
                Err(DomainError::Conflict(_)) if attempts < self.config.retry_budget => {
                    attempts += 1;
                    tracing::debug!(attempts, "stale product version, retrying apply");
                }
                Err(DomainError::Conflict(_)) => {
                    return Err(DomainError::conflict(
                        "concurrent stock updates exceeded the retry budget",
                    ));
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn candidate_stock(
        &self,
        product: &Product,
        kind: TransactionKind,
        quantity: i64,
    ) -> DomainResult<i64> {
        match kind {
            TransactionKind::Sale => {
                let candidate = product.stock - quantity;
                if candidate < 0 {
                    return Err(DomainError::InsufficientStock {
                        available: product.stock,
                        requested: quantity,
                    });
                }
                Ok(candidate)
            }
            TransactionKind::Restock => {
                let candidate = product
                    .stock
                    .checked_add(quantity)
                    .ok_or(DomainError::CapacityExceeded { limit: i64::MAX })?;
                if let Some(limit) = self.config.max_stock {
                    if candidate > limit {
                        return Err(DomainError::CapacityExceeded { limit });
                    }
                }
                Ok(candidate)
            }
        }
    }
}
