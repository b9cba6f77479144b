//! Process configuration, read once at startup and passed down as structs.

use stockledger_ledger::LedgerConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Everything the binary needs to wire itself up.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Postgres connection string; the in-memory store is used when unset.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub ledger: LedgerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            database_url: None,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            ledger: LedgerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read configuration from the environment:
    /// `BIND_ADDR`, `DATABASE_URL`, `DB_MAX_CONNECTIONS`,
    /// `LEDGER_RETRY_BUDGET`, `LEDGER_MAX_STOCK`.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = Some(url);
        }
        if let Ok(raw) = std::env::var("DB_MAX_CONNECTIONS") {
            config.db_max_connections = raw
                .parse()
                .map_err(|e| anyhow::anyhow!("DB_MAX_CONNECTIONS: {e}"))?;
        }
        if let Ok(raw) = std::env::var("LEDGER_RETRY_BUDGET") {
            config.ledger.retry_budget = raw
                .parse()
                .map_err(|e| anyhow::anyhow!("LEDGER_RETRY_BUDGET: {e}"))?;
        }
        if let Ok(raw) = std::env::var("LEDGER_MAX_STOCK") {
            config.ledger.max_stock = Some(
                raw.parse()
                    .map_err(|e| anyhow::anyhow!("LEDGER_MAX_STOCK: {e}"))?,
            );
        }

        Ok(config)
    }
}
