//! Integration tests for the full apply pipeline against the in-memory store.
//!
//! Verifies:
//! - stock conservation across arbitrary valid sequences
//! - zero side effects on every failure path
//! - price snapshots are immune to later price edits
//! - concurrent applies against one product serialize with no lost updates

use std::sync::Arc;

use proptest::prelude::*;

use stockledger_core::{DomainError, ProductId};
use stockledger_ledger::{
    LedgerConfig, LedgerEngine, ProductStore, TransactionKind, TransactionStore,
};
use stockledger_products::{NewProduct, Product};

use crate::memory::InMemoryStockStore;

async fn seed_product(store: &Arc<InMemoryStockStore>, stock: i64, unit_price: u64) -> ProductId {
    let product = Product::create(NewProduct {
        name: format!("Item {}", ProductId::new()),
        sku: None,
        description: None,
        category: None,
        unit_price,
        stock,
        low_stock_threshold: None,
    })
    .unwrap();
    store.insert(product).await.unwrap().id
}

/// Single-threaded block_on helper for non-async test bodies.
fn block_on<F: std::future::Future>(fut: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(fut)
}

fn engine(store: &Arc<InMemoryStockStore>) -> LedgerEngine {
    LedgerEngine::new(store.clone(), LedgerConfig::default())
}

#[tokio::test]
async fn sale_scenario_walks_stock_down_to_zero() {
    let store = Arc::new(InMemoryStockStore::new());
    let id = seed_product(&store, 10, 150).await;
    let engine = engine(&store);

    let receipt = engine.apply(id, TransactionKind::Sale, 3).await.unwrap();
    assert_eq!(receipt.product.stock, 7);
    assert_eq!(store.list_all().await.unwrap().len(), 1);

    let receipt = engine.apply(id, TransactionKind::Sale, 7).await.unwrap();
    assert_eq!(receipt.product.stock, 0);

    let err = engine.apply(id, TransactionKind::Sale, 1).await.unwrap_err();
    assert_eq!(
        err,
        DomainError::InsufficientStock {
            available: 0,
            requested: 1
        }
    );
    assert_eq!(store.get(id).await.unwrap().stock, 0);
    assert_eq!(store.list_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn ledger_list_resolves_products_and_orders_newest_first() {
    let store = Arc::new(InMemoryStockStore::new());
    let id = seed_product(&store, 0, 80).await;
    let engine = engine(&store);

    engine.apply(id, TransactionKind::Restock, 50).await.unwrap();
    engine.apply(id, TransactionKind::Sale, 20).await.unwrap();

    let entries = store.list_all().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].record.kind, TransactionKind::Sale);
    assert_eq!(entries[1].record.kind, TransactionKind::Restock);
    assert_eq!(entries[1].record.quantity, 50);
    assert_eq!(entries[0].product.as_ref().unwrap().stock, 30);
}

#[tokio::test]
async fn price_edits_never_rewrite_history() {
    let store = Arc::new(InMemoryStockStore::new());
    let id = seed_product(&store, 20, 500).await;
    let engine = engine(&store);

    engine.apply(id, TransactionKind::Sale, 2).await.unwrap();

    let mut product = store.get(id).await.unwrap();
    product.unit_price = 750;
    store.update(product).await.unwrap();

    engine.apply(id, TransactionKind::Sale, 2).await.unwrap();

    let entries = store.list_all().await.unwrap();
    assert_eq!(entries[0].record.unit_price_at_transaction, 750);
    assert_eq!(entries[1].record.unit_price_at_transaction, 500);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_on_one_product_lose_no_updates() {
    let store = Arc::new(InMemoryStockStore::new());
    let id = seed_product(&store, 1_000, 100).await;
    let engine = LedgerEngine::new(
        store.clone(),
        LedgerConfig {
            retry_budget: 64,
            max_stock: None,
        },
    );

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            let mut successes = 0u32;
            for _ in 0..25 {
                match engine.apply(id, TransactionKind::Sale, 1).await {
                    Ok(_) => successes += 1,
                    Err(DomainError::Conflict(_)) => {}
                    Err(other) => panic!("unexpected error: {other:?}"),
                }
            }
            successes
        }));
    }

    let mut total_successes = 0u32;
    for handle in handles {
        total_successes += handle.await.unwrap();
    }

    // Whatever serial order the commits took, the final count must equal the
    // initial count minus exactly the committed sales.
    let product = store.get(id).await.unwrap();
    assert_eq!(product.stock, 1_000 - i64::from(total_successes));
    assert_eq!(
        store.list_all().await.unwrap().len(),
        total_successes as usize
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_applies_on_different_products_proceed_independently() {
    let store = Arc::new(InMemoryStockStore::new());
    let mut ids = Vec::new();
    for _ in 0..4 {
        ids.push(seed_product(&store, 100, 10).await);
    }
    let engine = engine(&store);

    let mut handles = Vec::new();
    for id in ids.clone() {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..20 {
                engine.apply(id, TransactionKind::Sale, 1).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for id in ids {
        assert_eq!(store.get(id).await.unwrap().stock, 80);
    }
    assert_eq!(store.list_all().await.unwrap().len(), 80);
}

proptest! {
    /// Property: after any sequence of applies, stock equals the initial
    /// count plus committed restocks minus committed sales, and never dips
    /// below zero; rejected moves leave no trace in the ledger.
    #[test]
    fn stock_is_conserved_across_sequences(
        initial in 0i64..200,
        ops in prop::collection::vec((any::<bool>(), 1i64..40), 0..60),
    ) {
        block_on(async move {
            let store = Arc::new(InMemoryStockStore::new());
            let id = seed_product(&store, initial, 100).await;
            let engine = engine(&store);

            let mut expected = initial;
            let mut committed = 0usize;
            for (is_sale, quantity) in ops {
                let kind = if is_sale {
                    TransactionKind::Sale
                } else {
                    TransactionKind::Restock
                };
                match engine.apply(id, kind, quantity).await {
                    Ok(receipt) => {
                        expected += receipt.record.stock_delta();
                        committed += 1;
                    }
                    Err(DomainError::InsufficientStock { .. }) => {
                        assert!(is_sale && expected - quantity < 0);
                    }
                    Err(other) => panic!("unexpected error: {other:?}"),
                }
            }

            let product = store.get(id).await.unwrap();
            assert!(product.stock >= 0);
            assert_eq!(product.stock, expected);
            assert_eq!(store.list_all().await.unwrap().len(), committed);
        });
    }
}
