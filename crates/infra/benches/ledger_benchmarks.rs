use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use stockledger_infra::InMemoryStockStore;
use stockledger_ledger::{LedgerConfig, LedgerEngine, ProductStore, TransactionKind};
use stockledger_products::{NewProduct, Product};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("failed to build runtime")
}

fn seeded_engine(rt: &tokio::runtime::Runtime, stock: i64) -> (LedgerEngine, stockledger_core::ProductId) {
    let store = Arc::new(InMemoryStockStore::new());
    let product = Product::create(NewProduct {
        name: "Bench Widget".to_string(),
        sku: Some("BENCH-1".to_string()),
        description: None,
        category: None,
        unit_price: 100,
        stock,
        low_stock_threshold: None,
    })
    .unwrap();
    let id = product.id;
    rt.block_on(store.insert(product)).unwrap();
    (LedgerEngine::new(store, LedgerConfig::default()), id)
}

fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_apply");
    group.throughput(Throughput::Elements(1));

    group.bench_function("sale", |b| {
        let rt = runtime();
        let (engine, id) = seeded_engine(&rt, i64::MAX / 2);
        b.iter(|| {
            rt.block_on(engine.apply(id, TransactionKind::Sale, 1)).unwrap();
        });
    });

    group.bench_function("restock", |b| {
        let rt = runtime();
        let (engine, id) = seeded_engine(&rt, 0);
        b.iter(|| {
            rt.block_on(engine.apply(id, TransactionKind::Restock, 1)).unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_apply);
criterion_main!(benches);
