//! Category handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::category::{Category, CategoryInput};
use crate::services::CategoryService;
use crate::AppState;

/// Create a product category
pub async fn create_category(
    State(state): State<AppState>,
    Json(input): Json<CategoryInput>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let service = CategoryService::new(state.db.clone());
    let category = service.create_category(input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// List all categories
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    let service = CategoryService::new(state.db.clone());
    let categories = service.list_categories().await?;
    Ok(Json(categories))
}

/// Delete an empty category
pub async fn delete_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = CategoryService::new(state.db.clone());
    service.delete_category(category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
