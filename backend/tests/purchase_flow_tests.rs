//! Purchase flow integration tests
//!
//! Database-backed tests for the invariants the schema and transaction
//! scripts enforce:
//! - at most one open purchase system-wide (partial unique index)
//! - pay closes a bill exactly once and credits the ledger exactly once
//! - refused sale batches leave no partial state behind
//!
//! Each test runs against its own throwaway database with the crate's
//! migrations applied.

use rust_decimal::Decimal;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use scrap_shop_backend::error::AppError;
use scrap_shop_backend::services::payment::PayInput;
use scrap_shop_backend::services::product::CreateProductInput;
use scrap_shop_backend::services::purchase::OpenPurchaseInput;
use scrap_shop_backend::services::purchase_item::AddItemInput;
use scrap_shop_backend::services::stock_sale::SellBatchInput;
use scrap_shop_backend::services::{
    LedgerService, PaymentService, ProductService, PurchaseItemService, PurchaseService,
    StockSaleService,
};
use shared::models::{PaymentMethod, SellLine};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn sell_line(product_id: Uuid, weight: &str) -> SellLine {
    SellLine {
        product_id,
        weight_sold: dec(weight),
        note: None,
    }
}

async fn seed_product(pool: &PgPool, name: &str, unit_price: &str) -> Uuid {
    ProductService::new(pool.clone())
        .create_product(CreateProductInput {
            name: name.to_string(),
            unit_price: dec(unit_price),
            category_id: None,
        })
        .await
        .expect("product")
        .id
}

/// Open a bill, weigh one item onto it, and pay it, crediting the ledger.
async fn buy_stock(pool: &PgPool, product_id: Uuid, weight: &str) {
    let purchase = PurchaseService::new(pool.clone())
        .open_purchase(OpenPurchaseInput::default())
        .await
        .expect("open");
    PurchaseItemService::new(pool.clone())
        .add_item(
            purchase.id,
            AddItemInput {
                product_id,
                weight: dec(weight),
            },
        )
        .await
        .expect("item");
    PaymentService::new(pool.clone())
        .pay(
            purchase.id,
            PayInput {
                method: PaymentMethod::Cash,
                amount: dec("100.00"),
            },
        )
        .await
        .expect("pay");
}

#[sqlx::test(migrations = "./migrations")]
async fn second_open_purchase_is_refused(pool: PgPool) {
    let service = PurchaseService::new(pool.clone());

    let first = service
        .open_purchase(OpenPurchaseInput::default())
        .await
        .expect("first open");

    let second = service.open_purchase(OpenPurchaseInput::default()).await;
    assert!(matches!(second, Err(AppError::Conflict { .. })));

    // the re-fetch path still finds the surviving bill
    let open = service.get_open_purchase().await.expect("get open");
    assert_eq!(open.map(|p| p.id), Some(first.id));

    // cancelling frees the slot
    service.cancel_purchase(first.id).await.expect("cancel");
    service
        .open_purchase(OpenPurchaseInput::default())
        .await
        .expect("open after cancel");
}

#[sqlx::test(migrations = "./migrations")]
async fn pay_closes_the_bill_and_credits_the_ledger_once(pool: PgPool) {
    let product_id = seed_product(&pool, "เหล็กหนา", "8.00").await;

    let purchases = PurchaseService::new(pool.clone());
    let purchase = purchases
        .open_purchase(OpenPurchaseInput::default())
        .await
        .expect("open");
    PurchaseItemService::new(pool.clone())
        .add_item(
            purchase.id,
            AddItemInput {
                product_id,
                weight: dec("10.50"),
            },
        )
        .await
        .expect("item");

    let payments = PaymentService::new(pool.clone());
    let payment = payments
        .pay(
            purchase.id,
            PayInput {
                method: PaymentMethod::Cash,
                amount: dec("84.00"),
            },
        )
        .await
        .expect("pay");
    assert_eq!(payment.method, "cash");

    let closed = purchases.get_purchase(purchase.id).await.expect("get");
    assert_eq!(closed.status, "done");

    let ledger = LedgerService::new(pool.clone());
    let totals = ledger.get_totals(product_id).await.expect("totals");
    assert_eq!(totals.purchased_weight, dec("10.50"));
    assert_eq!(totals.sold_weight, Decimal::ZERO);

    // paying again must not close or credit a second time
    let again = payments
        .pay(
            purchase.id,
            PayInput {
                method: PaymentMethod::Transfer,
                amount: dec("84.00"),
            },
        )
        .await;
    assert!(matches!(again, Err(AppError::Conflict { .. })));

    let totals = ledger.get_totals(product_id).await.expect("totals");
    assert_eq!(totals.purchased_weight, dec("10.50"));
}

#[sqlx::test(migrations = "./migrations")]
async fn closed_bill_rejects_cancel_and_item_mutations(pool: PgPool) {
    let product_id = seed_product(&pool, "ทองแดง", "250.00").await;

    let purchases = PurchaseService::new(pool.clone());
    let purchase = purchases
        .open_purchase(OpenPurchaseInput::default())
        .await
        .expect("open");
    let items = PurchaseItemService::new(pool.clone());
    items
        .add_item(
            purchase.id,
            AddItemInput {
                product_id,
                weight: dec("2.00"),
            },
        )
        .await
        .expect("item");
    PaymentService::new(pool.clone())
        .pay(
            purchase.id,
            PayInput {
                method: PaymentMethod::Cash,
                amount: dec("500.00"),
            },
        )
        .await
        .expect("pay");

    let cancel = purchases.cancel_purchase(purchase.id).await;
    assert!(matches!(cancel, Err(AppError::Conflict { .. })));

    let add = items
        .add_item(
            purchase.id,
            AddItemInput {
                product_id,
                weight: dec("1.00"),
            },
        )
        .await;
    assert!(matches!(add, Err(AppError::Conflict { .. })));
}

#[sqlx::test(migrations = "./migrations")]
async fn oversold_batch_leaves_no_partial_state(pool: PgPool) {
    let product_id = seed_product(&pool, "อลูมิเนียม", "45.00").await;
    buy_stock(&pool, product_id, "10.00").await;

    let sales = StockSaleService::new(pool.clone());

    // each line alone fits the balance of 10; together they do not
    let refused = sales
        .sell_batch(SellBatchInput {
            lines: vec![sell_line(product_id, "6.00"), sell_line(product_id, "6.00")],
        })
        .await;
    match refused {
        Err(AppError::InsufficientStock {
            requested,
            available,
            ..
        }) => {
            assert_eq!(requested, dec("12.00"));
            assert_eq!(available, dec("10.00"));
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // nothing was recorded and nothing was debited
    let events = sales.list_sales(Some(product_id)).await.expect("list");
    assert!(events.is_empty());
    let totals = LedgerService::new(pool.clone())
        .get_totals(product_id)
        .await
        .expect("totals");
    assert_eq!(totals.sold_weight, Decimal::ZERO);

    // an exactly-covered batch drains the balance to zero
    let sold = sales
        .sell_batch(SellBatchInput {
            lines: vec![sell_line(product_id, "6.00"), sell_line(product_id, "4.00")],
        })
        .await
        .expect("sell");
    assert_eq!(sold.len(), 2);

    let totals = LedgerService::new(pool.clone())
        .get_totals(product_id)
        .await
        .expect("totals");
    assert_eq!(totals.balance(), Decimal::ZERO);
}

#[sqlx::test(migrations = "./migrations")]
async fn unknown_products_in_a_batch_are_all_named(pool: PgPool) {
    let ghost_a = Uuid::new_v4();
    let ghost_b = Uuid::new_v4();

    let refused = StockSaleService::new(pool.clone())
        .sell_batch(SellBatchInput {
            lines: vec![sell_line(ghost_a, "1.00"), sell_line(ghost_b, "1.00")],
        })
        .await;

    match refused {
        Err(AppError::NotFound(message)) => {
            assert!(message.contains(&ghost_a.to_string()));
            assert!(message.contains(&ghost_b.to_string()));
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn selling_without_purchase_history_is_refused(pool: PgPool) {
    let product_id = seed_product(&pool, "สังกะสี", "15.00").await;

    let sales = StockSaleService::new(pool.clone());
    let refused = sales
        .sell_batch(SellBatchInput {
            lines: vec![sell_line(product_id, "1.00")],
        })
        .await;
    match refused {
        Err(AppError::ValidationError(message)) => {
            assert!(message.contains(&product_id.to_string()));
        }
        other => panic!("expected ValidationError, got {other:?}"),
    }

    // a zero-initialized ledger row turns the refusal into a plain oversell
    LedgerService::new(pool.clone())
        .ensure_row(product_id)
        .await
        .expect("ensure");
    let refused = sales
        .sell_batch(SellBatchInput {
            lines: vec![sell_line(product_id, "1.00")],
        })
        .await;
    assert!(matches!(refused, Err(AppError::InsufficientStock { .. })));
}
