//! Purchase lifecycle handlers: bills, line items and payment

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::payment::{PayInput, Payment};
use crate::services::purchase::{OpenPurchaseInput, Purchase, PurchaseSummary};
use crate::services::purchase_item::{AddItemInput, PurchaseItem, UpdatePriceInput};
use crate::services::{PaymentService, PurchaseItemService, PurchaseService};
use crate::AppState;
use shared::models::PurchaseStatus;

#[derive(Debug, Default, Deserialize)]
pub struct PurchaseListQuery {
    pub status: Option<String>,
}

/// Open a new purchase bill
pub async fn open_purchase(
    State(state): State<AppState>,
    Json(input): Json<OpenPurchaseInput>,
) -> AppResult<(StatusCode, Json<Purchase>)> {
    let service = PurchaseService::new(state.db.clone());
    let purchase = service.open_purchase(input).await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

/// The currently open purchase, if any
pub async fn get_open_purchase(
    State(state): State<AppState>,
) -> AppResult<Json<Option<Purchase>>> {
    let service = PurchaseService::new(state.db.clone());
    let purchase = service.get_open_purchase().await?;
    Ok(Json(purchase))
}

/// Get a purchase by id
pub async fn get_purchase(
    State(state): State<AppState>,
    Path(purchase_id): Path<Uuid>,
) -> AppResult<Json<Purchase>> {
    let service = PurchaseService::new(state.db.clone());
    let purchase = service.get_purchase(purchase_id).await?;
    Ok(Json(purchase))
}

/// List purchases, optionally filtered by status
pub async fn list_purchases(
    State(state): State<AppState>,
    Query(query): Query<PurchaseListQuery>,
) -> AppResult<Json<Vec<Purchase>>> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            PurchaseStatus::parse(s).map_err(|message| AppError::Validation {
                field: "status".to_string(),
                message: message.to_string(),
                message_th: "สถานะไม่ถูกต้อง".to_string(),
            })
        })
        .transpose()?;

    let service = PurchaseService::new(state.db.clone());
    let purchases = service.list_purchases(status).await?;
    Ok(Json(purchases))
}

/// Cancel a still-open purchase
pub async fn cancel_purchase(
    State(state): State<AppState>,
    Path(purchase_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = PurchaseService::new(state.db.clone());
    service.cancel_purchase(purchase_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Weight and amount totals for a purchase
pub async fn purchase_summary(
    State(state): State<AppState>,
    Path(purchase_id): Path<Uuid>,
) -> AppResult<Json<PurchaseSummary>> {
    let service = PurchaseService::new(state.db.clone());
    let summary = service.purchase_summary(purchase_id).await?;
    Ok(Json(summary))
}

/// Add a weighed item to an open purchase
pub async fn add_item(
    State(state): State<AppState>,
    Path(purchase_id): Path<Uuid>,
    Json(input): Json<AddItemInput>,
) -> AppResult<(StatusCode, Json<PurchaseItem>)> {
    let service = PurchaseItemService::new(state.db.clone());
    let item = service.add_item(purchase_id, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// List a purchase's items
pub async fn list_items(
    State(state): State<AppState>,
    Path(purchase_id): Path<Uuid>,
) -> AppResult<Json<Vec<PurchaseItem>>> {
    let service = PurchaseItemService::new(state.db.clone());
    let items = service.list_items(purchase_id).await?;
    Ok(Json(items))
}

/// Override an item's price
pub async fn update_item_price(
    State(state): State<AppState>,
    Path((purchase_id, item_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<UpdatePriceInput>,
) -> AppResult<Json<PurchaseItem>> {
    let service = PurchaseItemService::new(state.db.clone());
    let item = service.update_item_price(purchase_id, item_id, input).await?;
    Ok(Json(item))
}

/// Remove an item from an open purchase
pub async fn delete_item(
    State(state): State<AppState>,
    Path((purchase_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    let service = PurchaseItemService::new(state.db.clone());
    service.delete_item(purchase_id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Pay an open purchase, closing it and crediting the ledger
pub async fn pay_purchase(
    State(state): State<AppState>,
    Path(purchase_id): Path<Uuid>,
    Json(input): Json<PayInput>,
) -> AppResult<(StatusCode, Json<Payment>)> {
    let service = PaymentService::new(state.db.clone());
    let payment = service.pay(purchase_id, input).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// The payment recorded for a purchase
pub async fn get_payment(
    State(state): State<AppState>,
    Path(purchase_id): Path<Uuid>,
) -> AppResult<Json<Payment>> {
    let service = PaymentService::new(state.db.clone());
    let payment = service.get_payment(purchase_id).await?;
    Ok(Json(payment))
}
