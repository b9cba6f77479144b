//! Infrastructure: store implementations backing the ledger traits.
//!
//! - `memory`: single-process store for tests and development.
//! - `postgres`: sqlx-backed store for production (behind the `postgres`
//!   feature), one database transaction per ledger commit.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::InMemoryStockStore;
#[cfg(feature = "postgres")]
pub use postgres::PgStockStore;

#[cfg(test)]
mod integration_tests;
