//! Purchase lifecycle service
//!
//! A purchase (bill) is opened for intake, accumulates line items while
//! `open`, and is closed exactly once by a payment. The database enforces
//! that at most one purchase is `open` at any time via a partial unique
//! index; a losing concurrent open receives a conflict and is expected to
//! re-fetch the currently open bill.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};
use shared::models::PurchaseStatus;

/// Purchase service for opening, reading and cancelling bills
#[derive(Clone)]
pub struct PurchaseService {
    db: PgPool,
}

/// A purchase bill with its (optional) customer name
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Purchase {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub customer_name: Option<String>,
}

/// Input for opening a purchase
#[derive(Debug, Default, Deserialize)]
pub struct OpenPurchaseInput {
    pub customer_id: Option<Uuid>,
}

/// Derived totals over a purchase's line items
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseSummary {
    pub total_weight: Decimal,
    pub total_amount: Decimal,
}

const PURCHASE_COLUMNS: &str = r#"
    p.id, p.customer_id, p.status, p.created_at, p.updated_at,
    c.full_name AS customer_name
"#;

impl PurchaseService {
    /// Create a new PurchaseService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Open a new purchase, optionally for a known customer.
    ///
    /// The single-open invariant is enforced by the partial unique index
    /// `ux_purchases_only_one_open`; a violation maps to a conflict rather
    /// than an internal error so the caller can re-fetch the open bill.
    pub async fn open_purchase(&self, input: OpenPurchaseInput) -> AppResult<Purchase> {
        if let Some(customer_id) = input.customer_id {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1)",
            )
            .bind(customer_id)
            .fetch_one(&self.db)
            .await?;

            if !exists {
                return Err(AppError::NotFound("Customer".to_string()));
            }
        }

        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO purchases (customer_id) VALUES ($1) RETURNING id",
        )
        .bind(input.customer_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "ux_purchases_only_one_open") {
                AppError::Conflict {
                    resource: "purchase".to_string(),
                    message: "A purchase is already open".to_string(),
                    message_th: "มีบิลค้างเปิดอยู่แล้ว".to_string(),
                }
            } else {
                e.into()
            }
        })?;

        self.get_purchase(id).await
    }

    /// The currently open purchase, if any (re-fetch path after a
    /// duplicate-open conflict).
    pub async fn get_open_purchase(&self) -> AppResult<Option<Purchase>> {
        let row = sqlx::query_as::<_, Purchase>(&format!(
            r#"
            SELECT {PURCHASE_COLUMNS}
            FROM purchases p
            LEFT JOIN customers c ON c.id = p.customer_id
            WHERE p.status = 'open'
            ORDER BY p.updated_at DESC
            LIMIT 1
            "#
        ))
        .fetch_optional(&self.db)
        .await?;

        Ok(row)
    }

    /// Get a purchase by id
    pub async fn get_purchase(&self, purchase_id: Uuid) -> AppResult<Purchase> {
        sqlx::query_as::<_, Purchase>(&format!(
            r#"
            SELECT {PURCHASE_COLUMNS}
            FROM purchases p
            LEFT JOIN customers c ON c.id = p.customer_id
            WHERE p.id = $1
            "#
        ))
        .bind(purchase_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase".to_string()))
    }

    /// List purchases, optionally filtered by status, newest first
    pub async fn list_purchases(&self, status: Option<PurchaseStatus>) -> AppResult<Vec<Purchase>> {
        let rows = sqlx::query_as::<_, Purchase>(&format!(
            r#"
            SELECT {PURCHASE_COLUMNS}
            FROM purchases p
            LEFT JOIN customers c ON c.id = p.customer_id
            WHERE ($1::text IS NULL OR p.status = $1)
            ORDER BY p.created_at DESC
            "#
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Cancel a still-open purchase: removes the bill and (by cascade) its
    /// line items. Forbidden once the purchase is done.
    pub async fn cancel_purchase(&self, purchase_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM purchases WHERE id = $1 AND status = 'open'")
            .bind(purchase_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            // distinguish "absent" from "already closed"
            let exists =
                sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM purchases WHERE id = $1)")
                    .bind(purchase_id)
                    .fetch_one(&self.db)
                    .await?;

            if exists {
                return Err(AppError::Conflict {
                    resource: "purchase".to_string(),
                    message: "Purchase is not open".to_string(),
                    message_th: "บิลนี้ปิดไปแล้ว ไม่สามารถยกเลิกได้".to_string(),
                });
            }
            return Err(AppError::NotFound("Purchase".to_string()));
        }

        Ok(())
    }

    /// Total weight and amount over the purchase's line items
    pub async fn purchase_summary(&self, purchase_id: Uuid) -> AppResult<PurchaseSummary> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM purchases WHERE id = $1)")
                .bind(purchase_id)
                .fetch_one(&self.db)
                .await?;

        if !exists {
            return Err(AppError::NotFound("Purchase".to_string()));
        }

        let summary = sqlx::query_as::<_, PurchaseSummary>(
            r#"
            SELECT
              COALESCE(SUM(weight), 0) AS total_weight,
              COALESCE(SUM(price), 0)  AS total_amount
            FROM purchase_items
            WHERE purchase_id = $1
            "#,
        )
        .bind(purchase_id)
        .fetch_one(&self.db)
        .await?;

        Ok(summary)
    }
}
