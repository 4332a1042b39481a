//! Line items on an open purchase
//!
//! Items may only be added, re-priced or removed while their purchase is
//! still `open`; every mutation takes a row lock on the purchase so a
//! concurrent payment cannot close the bill mid-edit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::PurchaseStatus;
use shared::validation::{compute_line_price, round_price, validate_weight, RoundingPolicy};

/// Purchase item service
#[derive(Clone)]
pub struct PurchaseItemService {
    db: PgPool,
}

/// A weighed line on a purchase bill
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseItem {
    pub id: Uuid,
    pub purchase_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub weight: Decimal,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Input for adding an item to a purchase
#[derive(Debug, Deserialize)]
pub struct AddItemInput {
    pub product_id: Uuid,
    pub weight: Decimal,
}

/// Input for overriding a line's price
#[derive(Debug, Deserialize)]
pub struct UpdatePriceInput {
    pub price: Decimal,
    #[serde(default)]
    pub rounding: Option<RoundingPolicy>,
    #[serde(default)]
    pub rounding_step: Option<Decimal>,
}

impl PurchaseItemService {
    /// Create a new PurchaseItemService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Add a weighed item to an open purchase. The line price defaults to
    /// weight x the product's current unit price, rounded half-up to
    /// satang.
    pub async fn add_item(&self, purchase_id: Uuid, input: AddItemInput) -> AppResult<PurchaseItem> {
        validate_weight(input.weight).map_err(|message| AppError::Validation {
            field: "weight".to_string(),
            message: message.to_string(),
            message_th: "น้ำหนักต้องไม่ติดลบ".to_string(),
        })?;

        let mut tx = self.db.begin().await?;

        Self::lock_open_purchase(&mut tx, purchase_id).await?;

        let product = sqlx::query_as::<_, ProductRow>(
            "SELECT name, unit_price FROM products WHERE id = $1",
        )
        .bind(input.product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let price = compute_line_price(input.weight, product.unit_price);

        let item = sqlx::query_as::<_, ItemRow>(
            r#"
            INSERT INTO purchase_items (purchase_id, product_id, weight, price)
            VALUES ($1, $2, $3, $4)
            RETURNING id, purchase_id, product_id, weight, price, created_at
            "#,
        )
        .bind(purchase_id)
        .bind(input.product_id)
        .bind(input.weight)
        .bind(price)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(item.with_name(product.name))
    }

    /// Override a line's price, optionally snapping it to a step (e.g.
    /// 0.25 baht) under the requested rounding policy.
    pub async fn update_item_price(
        &self,
        purchase_id: Uuid,
        item_id: Uuid,
        input: UpdatePriceInput,
    ) -> AppResult<PurchaseItem> {
        let policy = input.rounding.unwrap_or_default();
        let price = round_price(input.price, policy, input.rounding_step).map_err(|message| {
            AppError::Validation {
                field: "price".to_string(),
                message: message.to_string(),
                message_th: "ราคาไม่ถูกต้อง".to_string(),
            }
        })?;

        let mut tx = self.db.begin().await?;

        Self::lock_open_purchase(&mut tx, purchase_id).await?;

        let item = sqlx::query_as::<_, ItemRow>(
            r#"
            UPDATE purchase_items
            SET price = $3
            WHERE id = $2 AND purchase_id = $1
            RETURNING id, purchase_id, product_id, weight, price, created_at
            "#,
        )
        .bind(purchase_id)
        .bind(item_id)
        .bind(price)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase item".to_string()))?;

        let product_name =
            sqlx::query_scalar::<_, String>("SELECT name FROM products WHERE id = $1")
                .bind(item.product_id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        Ok(item.with_name(product_name))
    }

    /// Remove a line from an open purchase
    pub async fn delete_item(&self, purchase_id: Uuid, item_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        Self::lock_open_purchase(&mut tx, purchase_id).await?;

        let result = sqlx::query("DELETE FROM purchase_items WHERE id = $2 AND purchase_id = $1")
            .bind(purchase_id)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Purchase item".to_string()));
        }

        tx.commit().await?;

        Ok(())
    }

    /// List a purchase's items, oldest first (display order on the bill)
    pub async fn list_items(&self, purchase_id: Uuid) -> AppResult<Vec<PurchaseItem>> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM purchases WHERE id = $1)")
                .bind(purchase_id)
                .fetch_one(&self.db)
                .await?;

        if !exists {
            return Err(AppError::NotFound("Purchase".to_string()));
        }

        let items = sqlx::query_as::<_, PurchaseItem>(
            r#"
            SELECT pi.id, pi.purchase_id, pi.product_id, pr.name AS product_name,
                   pi.weight, pi.price, pi.created_at
            FROM purchase_items pi
            JOIN products pr ON pr.id = pi.product_id
            WHERE pi.purchase_id = $1
            ORDER BY pi.created_at ASC
            "#,
        )
        .bind(purchase_id)
        .fetch_all(&self.db)
        .await?;

        Ok(items)
    }

    /// Lock the purchase row and verify it still accepts item mutations.
    async fn lock_open_purchase(
        tx: &mut Transaction<'_, Postgres>,
        purchase_id: Uuid,
    ) -> AppResult<()> {
        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM purchases WHERE id = $1 FOR UPDATE",
        )
        .bind(purchase_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase".to_string()))?;

        let status = PurchaseStatus::parse(&status)
            .map_err(|e| AppError::Internal(format!("Bad purchase status in database: {e}")))?;

        if !status.allows_item_mutation() {
            return Err(AppError::Conflict {
                resource: "purchase".to_string(),
                message: "Purchase is not open".to_string(),
                message_th: "บิลนี้ปิดไปแล้ว ไม่สามารถแก้ไขรายการได้".to_string(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct ProductRow {
    name: String,
    unit_price: Decimal,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    purchase_id: Uuid,
    product_id: Uuid,
    weight: Decimal,
    price: Decimal,
    created_at: DateTime<Utc>,
}

impl ItemRow {
    fn with_name(self, product_name: String) -> PurchaseItem {
        PurchaseItem {
            id: self.id,
            purchase_id: self.purchase_id,
            product_id: self.product_id,
            product_name,
            weight: self.weight,
            price: self.price,
            created_at: self.created_at,
        }
    }
}
