//! Inventory reporting: the stock overview screen
//!
//! Read-only joins over products, ledger totals and sale history. Sorting
//! is restricted to a fixed whitelist of keys; each key maps to a constant
//! ORDER BY fragment, so no caller-supplied text ever reaches the query.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};

/// Inventory reporting service
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// One row of the stock overview
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InventoryItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub unit_price: Decimal,
    pub is_active: bool,
    pub purchased_weight: Decimal,
    pub sold_weight: Decimal,
    pub balance: Decimal,
    pub last_sale_date: Option<DateTime<Utc>>,
    pub last_sold_qty: Option<Decimal>,
}

/// Whitelisted sort keys for the inventory listing; the leading `-`
/// follows the query-string convention for descending order.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub enum InventorySort {
    #[serde(rename = "balance")]
    BalanceAsc,
    #[default]
    #[serde(rename = "-balance")]
    BalanceDesc,
    #[serde(rename = "name")]
    NameAsc,
    #[serde(rename = "-name")]
    NameDesc,
    #[serde(rename = "last_sale_date")]
    LastSaleAsc,
    #[serde(rename = "-last_sale_date")]
    LastSaleDesc,
}

impl InventorySort {
    fn order_by(self) -> &'static str {
        match self {
            InventorySort::BalanceAsc => "balance ASC, product_name ASC",
            InventorySort::BalanceDesc => "balance DESC, product_name ASC",
            InventorySort::NameAsc => "product_name ASC",
            InventorySort::NameDesc => "product_name DESC",
            InventorySort::LastSaleAsc => "last_sale_date ASC NULLS FIRST, product_name ASC",
            InventorySort::LastSaleDesc => "last_sale_date DESC NULLS LAST, product_name ASC",
        }
    }
}

/// Filters for the inventory listing; retired products are hidden unless
/// the caller asks for them.
#[derive(Debug, Deserialize)]
pub struct InventoryFilter {
    pub category_id: Option<Uuid>,
    pub q: Option<String>,
    #[serde(default = "default_only_active")]
    pub only_active: bool,
    #[serde(default)]
    pub sort: InventorySort,
}

fn default_only_active() -> bool {
    true
}

impl Default for InventoryFilter {
    fn default() -> Self {
        Self {
            category_id: None,
            q: None,
            only_active: true,
            sort: InventorySort::default(),
        }
    }
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Stock overview: every product with a ledger row, with its balance
    /// and the date it last sold.
    pub async fn list_inventory(
        &self,
        filter: InventoryFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<InventoryItem>> {
        let name_pattern = filter.q.as_deref().map(|q| format!("%{q}%"));

        let base = r#"
            FROM ledger_entries le
            JOIN products p ON p.id = le.product_id
            LEFT JOIN product_categories pc ON pc.id = p.category_id
            WHERE ($1::uuid IS NULL OR p.category_id = $1)
              AND ($2::text IS NULL OR p.name ILIKE $2)
              AND (NOT $3 OR p.is_active)
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) {base}"))
            .bind(filter.category_id)
            .bind(name_pattern.as_deref())
            .bind(filter.only_active)
            .fetch_one(&self.db)
            .await?;

        let order_by = filter.sort.order_by();
        let items = sqlx::query_as::<_, InventoryItem>(&format!(
            r#"
            SELECT
              p.id AS product_id,
              p.name AS product_name,
              p.category_id,
              pc.name AS category_name,
              p.unit_price,
              p.is_active,
              le.purchased_weight,
              le.sold_weight,
              le.purchased_weight - le.sold_weight AS balance,
              (SELECT MAX(se.sold_at) FROM sale_events se WHERE se.product_id = p.id)
                AS last_sale_date,
              (SELECT se.weight_sold FROM sale_events se
                WHERE se.product_id = p.id
                ORDER BY se.sold_at DESC, se.id DESC LIMIT 1)
                AS last_sold_qty
            {base}
            ORDER BY {order_by}
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(filter.category_id)
        .bind(name_pattern.as_deref())
        .bind(filter.only_active)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: items,
            pagination: PaginationMeta::new(&pagination, total as u64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sort_is_balance_descending() {
        assert_eq!(InventorySort::default(), InventorySort::BalanceDesc);
    }

    #[test]
    fn sort_keys_parse_from_query_convention() {
        let sort: InventorySort = serde_json::from_str("\"-last_sale_date\"").unwrap();
        assert_eq!(sort, InventorySort::LastSaleDesc);

        let sort: InventorySort = serde_json::from_str("\"name\"").unwrap();
        assert_eq!(sort, InventorySort::NameAsc);
    }

    #[test]
    fn unknown_sort_key_is_rejected() {
        assert!(serde_json::from_str::<InventorySort>("\"unit_price\"").is_err());
    }

    #[test]
    fn filter_hides_retired_products_by_default() {
        let filter: InventoryFilter = serde_json::from_str("{}").unwrap();
        assert!(filter.only_active);
        assert!(InventoryFilter::default().only_active);

        let filter: InventoryFilter = serde_json::from_str("{\"only_active\": false}").unwrap();
        assert!(!filter.only_active);
    }
}
