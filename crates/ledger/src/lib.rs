//! Stock-ledger domain module.
//!
//! The ledger is an append-only history of stock-affecting transactions.
//! `LedgerEngine::apply` is the single mutation path for stock counts: it
//! writes an immutable transaction record and the adjusted product under one
//! atomic commit, rejecting moves that would drive stock negative.

pub mod engine;
pub mod record;
pub mod store;

pub use engine::{LedgerConfig, LedgerEngine, LedgerReceipt};
pub use record::{LedgerEntry, TransactionKind, TransactionRecord};
pub use store::{ProductStore, StockStore, TransactionStore};
