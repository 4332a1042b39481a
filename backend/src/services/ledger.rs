//! Ledger store: per-product running totals of purchased vs. sold weight
//!
//! All ledger writes in the system go through [`LedgerService::apply_delta`],
//! inside the same transaction as the purchase or sale mutation that caused
//! them. The balance is therefore an O(1) read on every sale validation and
//! inventory listing, with no recomputation over item or sale history.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::LedgerTotals;

/// Ledger service for balance reads and delta application
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct TotalsRow {
    purchased_weight: Decimal,
    sold_weight: Decimal,
}

impl LedgerService {
    /// Create a new LedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Totals for a product that has purchase history. A product that
    /// exists but has no ledger row is reported as not found, which is
    /// distinct from a zero balance.
    pub async fn get_totals(&self, product_id: Uuid) -> AppResult<LedgerTotals> {
        let row = sqlx::query_as::<_, TotalsRow>(
            "SELECT purchased_weight, sold_weight FROM ledger_entries WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ledger entry".to_string()))?;

        Ok(LedgerTotals {
            purchased_weight: row.purchased_weight,
            sold_weight: row.sold_weight,
        })
    }

    /// Idempotent creation of a zero-initialized entry for a product.
    pub async fn ensure_row(&self, product_id: Uuid) -> AppResult<()> {
        let product_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(product_id)
                .fetch_one(&self.db)
                .await?;

        if !product_exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        sqlx::query(
            "INSERT INTO ledger_entries (product_id) VALUES ($1) ON CONFLICT (product_id) DO NOTHING",
        )
        .bind(product_id)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Apply a signed delta to a product's totals inside the caller's
    /// transaction. The accumulate happens in SQL (upsert with addition),
    /// never as read-modify-write in application code, so concurrent
    /// callers cannot lose updates.
    pub async fn apply_delta(
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        purchased_delta: Decimal,
        sold_delta: Decimal,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO ledger_entries (product_id, purchased_weight, sold_weight)
            VALUES ($1, $2, $3)
            ON CONFLICT (product_id) DO UPDATE
              SET purchased_weight = ledger_entries.purchased_weight + EXCLUDED.purchased_weight,
                  sold_weight      = ledger_entries.sold_weight + EXCLUDED.sold_weight
            "#,
        )
        .bind(product_id)
        .bind(purchased_delta)
        .bind(sold_delta)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
