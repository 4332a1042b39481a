//! Product catalog service
//!
//! Products carry the shop's current buy price per kilogram. Retiring a
//! product deactivates it instead of deleting, so ledger and sale history
//! stay intact.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::validation::validate_price;

/// Product service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// A catalog product with its category name
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub unit_price: Decimal,
    pub category_id: Option<Uuid>,
}

/// Input for updating a product; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub unit_price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

/// Filters for the product listing
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub q: Option<String>,
    #[serde(default)]
    pub only_active: bool,
}

const PRODUCT_COLUMNS: &str = r#"
    p.id, p.name, p.unit_price, p.category_id, pc.name AS category_name,
    p.is_active, p.created_at
"#;

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a product
    pub async fn create_product(&self, input: CreateProductInput) -> AppResult<Product> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Product name must not be empty".to_string(),
                message_th: "กรุณาระบุชื่อสินค้า".to_string(),
            });
        }

        validate_price(input.unit_price).map_err(|message| AppError::Validation {
            field: "unit_price".to_string(),
            message: message.to_string(),
            message_th: "ราคาต้องไม่ติดลบ".to_string(),
        })?;

        if let Some(category_id) = input.category_id {
            self.check_category_exists(category_id).await?;
        }

        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO products (name, unit_price, category_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(name)
        .bind(input.unit_price)
        .bind(input.category_id)
        .fetch_one(&self.db)
        .await?;

        self.get_product(id).await
    }

    /// Get a product by id
    pub async fn get_product(&self, product_id: Uuid) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            LEFT JOIN product_categories pc ON pc.id = p.category_id
            WHERE p.id = $1
            "#
        ))
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// List products with optional category, name and active filters
    pub async fn list_products(&self, filter: ProductFilter) -> AppResult<Vec<Product>> {
        let name_pattern = filter.q.as_deref().map(|q| format!("%{q}%"));

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            LEFT JOIN product_categories pc ON pc.id = p.category_id
            WHERE ($1::uuid IS NULL OR p.category_id = $1)
              AND ($2::text IS NULL OR p.name ILIKE $2)
              AND (NOT $3 OR p.is_active)
            ORDER BY p.name ASC
            "#
        ))
        .bind(filter.category_id)
        .bind(name_pattern.as_deref())
        .bind(filter.only_active)
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    /// Partial update of a product's fields
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<Product> {
        if let Some(price) = input.unit_price {
            validate_price(price).map_err(|message| AppError::Validation {
                field: "unit_price".to_string(),
                message: message.to_string(),
                message_th: "ราคาต้องไม่ติดลบ".to_string(),
            })?;
        }

        if let Some(category_id) = input.category_id {
            self.check_category_exists(category_id).await?;
        }

        let result = sqlx::query(
            r#"
            UPDATE products SET
              name = COALESCE($2, name),
              unit_price = COALESCE($3, unit_price),
              category_id = COALESCE($4, category_id),
              is_active = COALESCE($5, is_active)
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.unit_price)
        .bind(input.category_id)
        .bind(input.is_active)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        self.get_product(product_id).await
    }

    /// Retire a product from the catalog (soft delete)
    pub async fn deactivate_product(&self, product_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("UPDATE products SET is_active = FALSE WHERE id = $1")
            .bind(product_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        Ok(())
    }

    async fn check_category_exists(&self, category_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM product_categories WHERE id = $1)",
        )
        .bind(category_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Category".to_string()));
        }

        Ok(())
    }
}
