//! Payment service: closes a purchase and credits the ledger
//!
//! Paying is the commit point of the purchase lifecycle. In one
//! transaction: lock the purchase, reject a second payment, record the
//! payment, flip the status to `done`, and credit purchased weight to the
//! ledger for every product on the bill. Either all of it happens or none
//! of it does.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::services::LedgerService;
use shared::models::{PaymentMethod, PurchaseStatus};

/// Payment service
#[derive(Clone)]
pub struct PaymentService {
    db: PgPool,
}

/// A recorded payment
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub purchase_id: Uuid,
    pub method: String,
    pub amount: Decimal,
    pub paid_at: DateTime<Utc>,
}

/// Input for paying a purchase
#[derive(Debug, Deserialize)]
pub struct PayInput {
    pub method: PaymentMethod,
    pub amount: Decimal,
}

#[derive(Debug, FromRow)]
struct ProductWeight {
    product_id: Uuid,
    total_weight: Decimal,
}

impl PaymentService {
    /// Create a new PaymentService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Pay an open purchase, closing it and crediting the ledger.
    pub async fn pay(&self, purchase_id: Uuid, input: PayInput) -> AppResult<Payment> {
        if input.amount <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "amount".to_string(),
                message: "Payment amount must be positive".to_string(),
                message_th: "ยอดชำระต้องมากกว่าศูนย์".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM purchases WHERE id = $1 FOR UPDATE",
        )
        .bind(purchase_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase".to_string()))?;

        let status = PurchaseStatus::parse(&status)
            .map_err(|e| AppError::Internal(format!("Bad purchase status in database: {e}")))?;

        if status.is_terminal() {
            return Err(AppError::Conflict {
                resource: "purchase".to_string(),
                message: "Purchase is already paid".to_string(),
                message_th: "บิลนี้ชำระเงินไปแล้ว".to_string(),
            });
        }

        let total_amount = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(price), 0) FROM purchase_items WHERE purchase_id = $1",
        )
        .bind(purchase_id)
        .fetch_one(&mut *tx)
        .await?;

        if total_amount <= Decimal::ZERO {
            return Err(AppError::ValidationError(
                "Cannot pay an empty purchase".to_string(),
            ));
        }

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (purchase_id, method, amount)
            VALUES ($1, $2, $3)
            RETURNING id, purchase_id, method, amount, paid_at
            "#,
        )
        .bind(purchase_id)
        .bind(input.method.as_str())
        .bind(input.amount)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "payments_purchase_id_key") {
                AppError::Conflict {
                    resource: "payment".to_string(),
                    message: "Purchase is already paid".to_string(),
                    message_th: "บิลนี้ชำระเงินไปแล้ว".to_string(),
                }
            } else {
                e.into()
            }
        })?;

        sqlx::query(
            "UPDATE purchases SET status = 'done', updated_at = now() WHERE id = $1 AND status = 'open'",
        )
        .bind(purchase_id)
        .execute(&mut *tx)
        .await?;

        // credit purchased weight per product, in ascending id order so
        // concurrent sales lock ledger rows in the same order
        let weights = sqlx::query_as::<_, ProductWeight>(
            r#"
            SELECT product_id, SUM(weight) AS total_weight
            FROM purchase_items
            WHERE purchase_id = $1
            GROUP BY product_id
            ORDER BY product_id
            "#,
        )
        .bind(purchase_id)
        .fetch_all(&mut *tx)
        .await?;

        for w in &weights {
            LedgerService::apply_delta(&mut tx, w.product_id, w.total_weight, Decimal::ZERO)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            purchase_id = %purchase_id,
            amount = %payment.amount,
            products = weights.len(),
            "purchase paid and ledger credited"
        );

        Ok(payment)
    }

    /// The payment recorded for a purchase, if it has been paid
    pub async fn get_payment(&self, purchase_id: Uuid) -> AppResult<Payment> {
        sqlx::query_as::<_, Payment>(
            "SELECT id, purchase_id, method, amount, paid_at FROM payments WHERE purchase_id = $1",
        )
        .bind(purchase_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment".to_string()))
    }
}
