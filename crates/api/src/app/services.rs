use std::sync::Arc;

use stockledger_infra::InMemoryStockStore;
use stockledger_ledger::{LedgerConfig, LedgerEngine, StockStore};

/// Shared application services handed to every handler via `Extension`.
pub struct AppServices {
    store: Arc<dyn StockStore>,
    ledger: LedgerEngine,
}

impl AppServices {
    pub fn new(store: Arc<dyn StockStore>, config: LedgerConfig) -> Self {
        let ledger = LedgerEngine::new(store.clone(), config);
        Self { store, ledger }
    }

    /// In-memory wiring, used when no database is configured and in tests.
    pub fn in_memory(config: LedgerConfig) -> Self {
        Self::new(Arc::new(InMemoryStockStore::new()), config)
    }

    pub fn store(&self) -> &Arc<dyn StockStore> {
        &self.store
    }

    pub fn ledger(&self) -> &LedgerEngine {
        &self.ledger
    }
}
