//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Validation errors are always detected before any write and are freely
/// retryable by the caller. `Persistence` and `Conflict` are surfaced as-is;
/// the ledger performs no silent retries of persistence failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. empty product name).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found.
    #[error("not found")]
    NotFound,

    /// Unknown transaction kind (must be `sale` or `restock`).
    #[error("invalid transaction kind: {0}")]
    InvalidKind(String),

    /// Transaction quantity must be a positive integer.
    #[error("invalid quantity: {0} (must be >= 1)")]
    InvalidQuantity(i64),

    /// A sale would drive the stock count negative.
    #[error("insufficient stock: {available} available, {requested} requested")]
    InsufficientStock { available: i64, requested: i64 },

    /// A restock would push the stock count past the configured maximum.
    #[error("stock capacity exceeded: limit is {limit}")]
    CapacityExceeded { limit: i64 },

    /// Storage-level uniqueness violation (product name or SKU).
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// Optimistic-concurrency conflict (stale version, or retry budget spent).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A store write or read failed after validation passed.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn duplicate_key(msg: impl Into<String>) -> Self {
        Self::DuplicateKey(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }
}
