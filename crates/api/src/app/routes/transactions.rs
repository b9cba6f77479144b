use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use stockledger_core::ProductId;
use stockledger_ledger::TransactionKind;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", post(record_transaction).get(list_transactions))
}

pub async fn record_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RecordTransactionRequest>,
) -> axum::response::Response {
    let product_id: ProductId = match body.product_id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let kind: TransactionKind = match body.kind.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.ledger().apply(product_id, kind, body.quantity).await {
        Ok(receipt) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "record": dto::record_to_json(&receipt.record),
                "product": dto::product_to_json(&receipt.product),
            })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store().list_all().await {
        Ok(entries) => {
            let items: Vec<_> = entries.iter().map(dto::entry_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}
