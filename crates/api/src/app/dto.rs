use serde::Deserialize;
use serde_json::json;

use stockledger_ledger::{LedgerEntry, TransactionRecord};
use stockledger_products::{NewProduct, Product, ProductUpdate};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit_price: u64,
    #[serde(default)]
    pub stock: i64,
    pub low_stock_threshold: Option<i64>,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(body: CreateProductRequest) -> Self {
        NewProduct {
            name: body.name,
            sku: body.sku,
            description: body.description,
            category: body.category,
            unit_price: body.unit_price,
            stock: body.stock,
            low_stock_threshold: body.low_stock_threshold,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit_price: Option<u64>,
    pub stock: Option<i64>,
    pub low_stock_threshold: Option<i64>,
}

impl From<UpdateProductRequest> for ProductUpdate {
    fn from(body: UpdateProductRequest) -> Self {
        ProductUpdate {
            name: body.name,
            sku: body.sku,
            description: body.description,
            category: body.category,
            unit_price: body.unit_price,
            stock: body.stock,
            low_stock_threshold: body.low_stock_threshold,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordTransactionRequest {
    pub product_id: String,
    pub kind: String,
    pub quantity: i64,
}

// -------------------------
// Response mapping
// -------------------------

pub fn product_to_json(product: &Product) -> serde_json::Value {
    json!({
        "id": product.id.to_string(),
        "sku": product.sku,
        "name": product.name,
        "description": product.description,
        "category": product.category,
        "unit_price": product.unit_price,
        "stock": product.stock,
        "low_stock_threshold": product.low_stock_threshold,
        "low_stock": product.is_low_stock(),
        "created_at": product.created_at.to_rfc3339(),
        "updated_at": product.updated_at.to_rfc3339(),
    })
}

pub fn record_to_json(record: &TransactionRecord) -> serde_json::Value {
    json!({
        "id": record.id.to_string(),
        "product_id": record.product_id.to_string(),
        "kind": record.kind.as_str(),
        "quantity": record.quantity,
        "unit_price_at_transaction": record.unit_price_at_transaction,
        "recorded_at": record.recorded_at.to_rfc3339(),
    })
}

/// Ledger entry with its referenced product resolved; `product` is `null`
/// when the product has since been deleted.
pub fn entry_to_json(entry: &LedgerEntry) -> serde_json::Value {
    let product = entry.product.as_ref().map(|p| {
        json!({
            "id": p.id.to_string(),
            "name": p.name,
            "unit_price": p.unit_price,
        })
    });
    let mut value = record_to_json(&entry.record);
    value["product"] = product.unwrap_or(serde_json::Value::Null);
    value
}
