//! Product category service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};

/// Category service
#[derive(Clone)]
pub struct CategoryService {
    db: PgPool,
}

/// A product category
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating or renaming a category
#[derive(Debug, Deserialize)]
pub struct CategoryInput {
    pub name: String,
}

impl CategoryService {
    /// Create a new CategoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a category; names are unique case-insensitively
    pub async fn create_category(&self, input: CategoryInput) -> AppResult<Category> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Category name must not be empty".to_string(),
                message_th: "กรุณาระบุชื่อหมวดหมู่".to_string(),
            });
        }

        sqlx::query_as::<_, Category>(
            "INSERT INTO product_categories (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "ux_product_categories_lower_name") {
                AppError::DuplicateEntry(format!("Category '{name}' already exists"))
            } else {
                e.into()
            }
        })
    }

    /// List all categories, alphabetically
    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at FROM product_categories ORDER BY name ASC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(categories)
    }

    /// Delete an empty category; a category still referenced by products
    /// cannot be removed.
    pub async fn delete_category(&self, category_id: Uuid) -> AppResult<()> {
        let in_use = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE category_id = $1)",
        )
        .bind(category_id)
        .fetch_one(&self.db)
        .await?;

        if in_use {
            return Err(AppError::Conflict {
                resource: "category".to_string(),
                message: "Category is still in use by products".to_string(),
                message_th: "หมวดหมู่นี้ยังมีสินค้าอยู่ ไม่สามารถลบได้".to_string(),
            });
        }

        let result = sqlx::query("DELETE FROM product_categories WHERE id = $1")
            .bind(category_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Category".to_string()));
        }

        Ok(())
    }
}
