//! Inventory handlers: stock overview, ledger reads and sale batches

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::inventory::{InventoryFilter, InventoryItem};
use crate::services::stock_sale::{SaleEvent, SellBatchInput};
use crate::services::{InventoryService, LedgerService, StockSaleService};
use crate::AppState;
use shared::types::{PaginatedResponse, Pagination};

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub product_id: Uuid,
    pub purchased_weight: Decimal,
    pub sold_weight: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Default, Deserialize)]
pub struct SalesQuery {
    pub product_id: Option<Uuid>,
}

/// Stock overview listing
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(filter): Query<InventoryFilter>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<InventoryItem>>> {
    let service = InventoryService::new(state.db.clone());
    let page = service.list_inventory(filter, pagination).await?;
    Ok(Json(page))
}

/// Ledger totals and sellable balance for one product
pub async fn get_balance(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<BalanceResponse>> {
    let service = LedgerService::new(state.db.clone());
    let totals = service.get_totals(product_id).await?;

    Ok(Json(BalanceResponse {
        product_id,
        purchased_weight: totals.purchased_weight,
        sold_weight: totals.sold_weight,
        balance: totals.balance(),
    }))
}

/// Create a zero-initialized ledger entry for a product (idempotent)
pub async fn ensure_ledger_entry(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = LedgerService::new(state.db.clone());
    service.ensure_row(product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Sell a batch of stock atomically
pub async fn sell_batch(
    State(state): State<AppState>,
    Json(input): Json<SellBatchInput>,
) -> AppResult<(StatusCode, Json<Vec<SaleEvent>>)> {
    let service = StockSaleService::new(state.db.clone());
    let events = service.sell_batch(input).await?;
    Ok((StatusCode::CREATED, Json(events)))
}

/// Sale history, optionally filtered by product
pub async fn list_sales(
    State(state): State<AppState>,
    Query(query): Query<SalesQuery>,
) -> AppResult<Json<Vec<SaleEvent>>> {
    let service = StockSaleService::new(state.db.clone());
    let events = service.list_sales(query.product_id).await?;
    Ok(Json(events))
}

/// Reverse a recorded sale event
pub async fn delete_sale_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = StockSaleService::new(state.db.clone());
    service.delete_sale_event(event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
