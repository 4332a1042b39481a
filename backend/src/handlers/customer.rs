//! Customer handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::customer::{Customer, CustomerInput};
use crate::services::purchase::Purchase;
use crate::services::CustomerService;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CustomerQuery {
    pub q: Option<String>,
}

/// Register a customer (upserts by national id)
pub async fn register_customer(
    State(state): State<AppState>,
    Json(input): Json<CustomerInput>,
) -> AppResult<(StatusCode, Json<Customer>)> {
    let service = CustomerService::new(state.db.clone());
    let customer = service.register_customer(input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Get a customer by id
pub async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<Customer>> {
    let service = CustomerService::new(state.db.clone());
    let customer = service.get_customer(customer_id).await?;
    Ok(Json(customer))
}

/// List customers, optionally searched by name or national id
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<CustomerQuery>,
) -> AppResult<Json<Vec<Customer>>> {
    let service = CustomerService::new(state.db.clone());
    let customers = service.list_customers(query.q).await?;
    Ok(Json(customers))
}

/// A customer's purchase history
pub async fn purchase_history(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<Vec<Purchase>>> {
    let service = CustomerService::new(state.db.clone());
    let purchases = service.purchase_history(customer_id).await?;
    Ok(Json(purchases))
}
