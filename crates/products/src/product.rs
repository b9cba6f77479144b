use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockledger_core::{DomainError, DomainResult, ProductId};

/// Default low-stock threshold when none is supplied at creation.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

const DEFAULT_DESCRIPTION: &str = "No description provided.";
const DEFAULT_CATEGORY: &str = "General";

/// A catalog product with its current on-hand stock count.
///
/// Invariant: `stock` is never negative. Stock is mutated through the ledger
/// engine's `apply` operation; administrative updates may set it directly but
/// go through the same validation.
///
/// `version` is an optimistic-concurrency revision bumped by the store on
/// every successful write. Two writers racing on the same product cannot both
/// commit against the same version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub category: String,
    /// Price in the smallest currency unit (e.g. cents).
    pub unit_price: u64,
    pub stock: i64,
    pub low_stock_threshold: i64,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product. Optional fields fall back to the same
/// defaults the catalog has always used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit_price: u64,
    #[serde(default)]
    pub stock: i64,
    pub low_stock_threshold: Option<i64>,
}

/// Partial administrative update. `None` fields are left untouched.
///
/// This path bypasses the ledger (no transaction record is written), so it
/// must re-validate everything the creation path validates, including stock
/// non-negativity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit_price: Option<u64>,
    pub stock: Option<i64>,
    pub low_stock_threshold: Option<i64>,
}

impl Product {
    /// Validate and build a product from creation input.
    pub fn create(input: NewProduct) -> DomainResult<Self> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }

        let sku = match input.sku {
            Some(sku) => {
                let sku = sku.trim().to_string();
                if sku.is_empty() {
                    return Err(DomainError::validation("SKU cannot be empty"));
                }
                sku
            }
            None => generate_sku(),
        };

        if input.stock < 0 {
            return Err(DomainError::validation("stock count cannot be negative"));
        }

        let low_stock_threshold = input
            .low_stock_threshold
            .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
        if low_stock_threshold < 0 {
            return Err(DomainError::validation(
                "low-stock threshold cannot be negative",
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: ProductId::new(),
            sku,
            name,
            description: input
                .description
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            category: input.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            unit_price: input.unit_price,
            stock: input.stock,
            low_stock_threshold,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply an administrative update in place.
    ///
    /// All fields are validated before any is assigned, so a rejected update
    /// leaves `self` untouched.
    pub fn apply_update(&mut self, update: ProductUpdate) -> DomainResult<()> {
        let name = match update.name {
            Some(name) => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(DomainError::validation("product name cannot be empty"));
                }
                Some(name)
            }
            None => None,
        };
        let sku = match update.sku {
            Some(sku) => {
                let sku = sku.trim().to_string();
                if sku.is_empty() {
                    return Err(DomainError::validation("SKU cannot be empty"));
                }
                Some(sku)
            }
            None => None,
        };
        if let Some(stock) = update.stock {
            if stock < 0 {
                return Err(DomainError::validation("stock count cannot be negative"));
            }
        }
        if let Some(threshold) = update.low_stock_threshold {
            if threshold < 0 {
                return Err(DomainError::validation(
                    "low-stock threshold cannot be negative",
                ));
            }
        }

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(sku) = sku {
            self.sku = sku;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(unit_price) = update.unit_price {
            self.unit_price = unit_price;
        }
        if let Some(stock) = update.stock {
            self.stock = stock;
        }
        if let Some(threshold) = update.low_stock_threshold {
            self.low_stock_threshold = threshold;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Advisory replenishment flag (display concern, never enforced).
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.low_stock_threshold
    }
}

/// Random 8-character uppercase SKU, used when creation input omits one.
fn generate_sku() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    raw[..8].to_uppercase()
}
