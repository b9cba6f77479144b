use std::sync::Arc;

use stockledger_api::app::AppServices;
use stockledger_api::config::AppConfig;
use stockledger_infra::{InMemoryStockStore, PgStockStore};
use stockledger_ledger::StockStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockledger_observability::init();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn StockStore> = match &config.database_url {
        Some(url) => {
            let store = PgStockStore::connect(url, config.db_max_connections).await?;
            tracing::info!("using postgres store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store");
            Arc::new(InMemoryStockStore::new())
        }
    };

    let services = Arc::new(AppServices::new(store, config.ledger.clone()));
    let app = stockledger_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
