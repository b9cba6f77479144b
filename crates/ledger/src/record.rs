use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, ProductId, TransactionId};
use stockledger_products::Product;

/// Direction of a stock movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Decreases the stock count.
    Sale,
    /// Increases the stock count.
    Restock,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Sale => "sale",
            TransactionKind::Restock => "restock",
        }
    }
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(TransactionKind::Sale),
            "restock" => Ok(TransactionKind::Restock),
            other => Err(DomainError::InvalidKind(other.to_string())),
        }
    }
}

/// One immutable entry in the stock ledger.
///
/// Once persisted, a record is never updated or deleted. `product_id` may
/// dangle after the referenced product is removed; readers resolve it to an
/// `Option` rather than assuming presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub product_id: ProductId,
    pub kind: TransactionKind,
    /// Quantity moved by this transaction, always >= 1.
    pub quantity: i64,
    /// Snapshot of the product's price at recording time. Later price edits
    /// never retroactively alter it.
    pub unit_price_at_transaction: u64,
    pub recorded_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Build a record for a validated movement. The engine checks the
    /// quantity before calling this.
    pub fn new(
        product_id: ProductId,
        kind: TransactionKind,
        quantity: i64,
        unit_price_at_transaction: u64,
    ) -> Self {
        debug_assert!(quantity >= 1);
        Self {
            id: TransactionId::new(),
            product_id,
            kind,
            quantity,
            unit_price_at_transaction,
            recorded_at: Utc::now(),
        }
    }

    /// Signed effect of this record on a stock count.
    pub fn stock_delta(&self) -> i64 {
        match self.kind {
            TransactionKind::Sale => -self.quantity,
            TransactionKind::Restock => self.quantity,
        }
    }
}

/// A ledger record together with its referenced product, resolved at read
/// time (absent when the product has since been deleted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub record: TransactionRecord,
    pub product: Option<Product>,
}
