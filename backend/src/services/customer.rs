//! Customer service
//!
//! Customers are identified by national id when known. Registering the
//! same national id again updates the stored name and address instead of
//! failing, which matches how the front desk actually uses the form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::purchase::Purchase;

/// Customer service
#[derive(Clone)]
pub struct CustomerService {
    db: PgPool,
}

/// A customer with the date of their most recent purchase
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub national_id: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_purchase_date: Option<DateTime<Utc>>,
}

/// Input for registering a customer
#[derive(Debug, Deserialize)]
pub struct CustomerInput {
    pub full_name: Option<String>,
    pub national_id: Option<String>,
    pub address: Option<String>,
}

const CUSTOMER_COLUMNS: &str = r#"
    c.id, c.full_name, c.national_id, c.address, c.created_at,
    (SELECT MAX(p.created_at) FROM purchases p WHERE p.customer_id = c.id)
      AS last_purchase_date
"#;

impl CustomerService {
    /// Create a new CustomerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a customer. When a national id is given and already known,
    /// the existing record is updated in place.
    pub async fn register_customer(&self, input: CustomerInput) -> AppResult<Customer> {
        let national_id = input
            .national_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let id = match national_id {
            Some(national_id) => {
                sqlx::query_scalar::<_, Uuid>(
                    r#"
                    INSERT INTO customers (full_name, national_id, address)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (national_id) DO UPDATE
                      SET full_name = COALESCE(EXCLUDED.full_name, customers.full_name),
                          address   = COALESCE(EXCLUDED.address, customers.address)
                    RETURNING id
                    "#,
                )
                .bind(input.full_name.as_deref())
                .bind(national_id)
                .bind(input.address.as_deref())
                .fetch_one(&self.db)
                .await?
            }
            None => {
                sqlx::query_scalar::<_, Uuid>(
                    "INSERT INTO customers (full_name, address) VALUES ($1, $2) RETURNING id",
                )
                .bind(input.full_name.as_deref())
                .bind(input.address.as_deref())
                .fetch_one(&self.db)
                .await?
            }
        };

        self.get_customer(id).await
    }

    /// Get a customer by id
    pub async fn get_customer(&self, customer_id: Uuid) -> AppResult<Customer> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers c WHERE c.id = $1"
        ))
        .bind(customer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))
    }

    /// List customers, most recent sellers first
    pub async fn list_customers(&self, q: Option<String>) -> AppResult<Vec<Customer>> {
        let pattern = q.as_deref().map(|q| format!("%{q}%"));

        let customers = sqlx::query_as::<_, Customer>(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers c
            WHERE ($1::text IS NULL
                   OR c.full_name ILIKE $1
                   OR c.national_id ILIKE $1)
            ORDER BY last_purchase_date DESC NULLS LAST, c.created_at DESC
            "#
        ))
        .bind(pattern.as_deref())
        .fetch_all(&self.db)
        .await?;

        Ok(customers)
    }

    /// A customer's purchase history, newest first
    pub async fn purchase_history(&self, customer_id: Uuid) -> AppResult<Vec<Purchase>> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1)")
                .bind(customer_id)
                .fetch_one(&self.db)
                .await?;

        if !exists {
            return Err(AppError::NotFound("Customer".to_string()));
        }

        let purchases = sqlx::query_as::<_, Purchase>(
            r#"
            SELECT p.id, p.customer_id, p.status, p.created_at, p.updated_at,
                   c.full_name AS customer_name
            FROM purchases p
            LEFT JOIN customers c ON c.id = p.customer_id
            WHERE p.customer_id = $1
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.db)
        .await?;

        Ok(purchases)
    }
}
