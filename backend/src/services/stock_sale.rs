//! Outgoing stock: atomic multi-line sale batches
//!
//! A sale batch either fully commits or leaves nothing behind. Lines for
//! the same product are aggregated before the balance check, so a batch
//! cannot oversell by splitting a too-large quantity across lines. Ledger
//! rows are locked in ascending product-id order to avoid deadlocks
//! between concurrent batches.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::LedgerService;
use shared::models::{aggregate_sell_lines, find_shortfall, validate_sell_lines, SellLine};

/// Stock sale service
#[derive(Clone)]
pub struct StockSaleService {
    db: PgPool,
}

/// A committed outgoing stock movement
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SaleEvent {
    pub id: Uuid,
    pub product_id: Uuid,
    pub weight_sold: Decimal,
    pub note: Option<String>,
    pub sold_at: DateTime<Utc>,
}

/// Input for a sale batch
#[derive(Debug, Deserialize)]
pub struct SellBatchInput {
    pub lines: Vec<SellLine>,
}

#[derive(Debug, FromRow)]
struct LockedTotals {
    product_id: Uuid,
    purchased_weight: Decimal,
    sold_weight: Decimal,
}

impl StockSaleService {
    /// Create a new StockSaleService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Sell a batch of stock atomically. One sale event is recorded per
    /// input line; the ledger is debited once per product with the
    /// aggregated weight.
    pub async fn sell_batch(&self, input: SellBatchInput) -> AppResult<Vec<SaleEvent>> {
        validate_sell_lines(&input.lines)
            .map_err(|message| AppError::ValidationError(message.to_string()))?;

        // ascending product-id order doubles as the lock order
        let requested = aggregate_sell_lines(&input.lines);
        let product_ids: Vec<Uuid> = requested.keys().copied().collect();

        let mut tx = self.db.begin().await?;

        let known = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM products WHERE id = ANY($1)",
        )
        .bind(&product_ids)
        .fetch_all(&mut *tx)
        .await?;

        // product_ids comes from a BTreeMap, so offenders list in sorted order
        let missing: Vec<String> = product_ids
            .iter()
            .copied()
            .filter(|id| !known.contains(id))
            .map(|id| id.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::NotFound(format!("Product(s) {}", missing.join(", "))));
        }

        let locked = sqlx::query_as::<_, LockedTotals>(
            r#"
            SELECT product_id, purchased_weight, sold_weight
            FROM ledger_entries
            WHERE product_id = ANY($1)
            ORDER BY product_id
            FOR UPDATE
            "#,
        )
        .bind(&product_ids)
        .fetch_all(&mut *tx)
        .await?;

        let balances: HashMap<Uuid, Decimal> = locked
            .iter()
            .map(|row| (row.product_id, row.purchased_weight - row.sold_weight))
            .collect();

        let unpurchased: Vec<String> = product_ids
            .iter()
            .copied()
            .filter(|id| !balances.contains_key(id))
            .map(|id| id.to_string())
            .collect();
        if !unpurchased.is_empty() {
            return Err(AppError::ValidationError(format!(
                "Product(s) {} have never been purchased, cannot sell",
                unpurchased.join(", ")
            )));
        }

        if let Some(shortfall) = find_shortfall(&requested, &balances) {
            return Err(AppError::InsufficientStock {
                product_id: shortfall.product_id,
                requested: shortfall.requested,
                available: shortfall.available,
            });
        }

        let mut events = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let event = sqlx::query_as::<_, SaleEvent>(
                r#"
                INSERT INTO sale_events (product_id, weight_sold, note)
                VALUES ($1, $2, $3)
                RETURNING id, product_id, weight_sold, note, sold_at
                "#,
            )
            .bind(line.product_id)
            .bind(line.weight_sold)
            .bind(line.note.as_deref())
            .fetch_one(&mut *tx)
            .await?;
            events.push(event);
        }

        for (product_id, total) in &requested {
            LedgerService::apply_delta(&mut tx, *product_id, Decimal::ZERO, *total).await?;
        }

        tx.commit().await?;

        tracing::info!(
            lines = events.len(),
            products = requested.len(),
            "sale batch committed"
        );

        Ok(events)
    }

    /// Reverse a recorded sale: deletes the event and credits the weight
    /// back onto the ledger, in one transaction.
    pub async fn delete_sale_event(&self, event_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let event = sqlx::query_as::<_, SaleEvent>(
            r#"
            SELECT id, product_id, weight_sold, note, sold_at
            FROM sale_events
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale event".to_string()))?;

        sqlx::query("DELETE FROM sale_events WHERE id = $1")
            .bind(event_id)
            .execute(&mut *tx)
            .await?;

        LedgerService::apply_delta(&mut tx, event.product_id, Decimal::ZERO, -event.weight_sold)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Sale history, newest first, optionally filtered by product
    pub async fn list_sales(&self, product_id: Option<Uuid>) -> AppResult<Vec<SaleEvent>> {
        let events = sqlx::query_as::<_, SaleEvent>(
            r#"
            SELECT id, product_id, weight_sold, note, sold_at
            FROM sale_events
            WHERE ($1::uuid IS NULL OR product_id = $1)
            ORDER BY sold_at DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(events)
    }
}
