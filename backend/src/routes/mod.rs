//! API route definitions

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::handlers;
use crate::AppState;

/// All /api/v1 routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/categories", category_routes())
        .nest("/products", product_routes())
        .nest("/customers", customer_routes())
        .nest("/purchases", purchase_routes())
        .nest("/inventory", inventory_routes())
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::category::list_categories).post(handlers::category::create_category),
        )
        .route("/:category_id", delete(handlers::category::delete_category))
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::product::list_products).post(handlers::product::create_product),
        )
        .route(
            "/:product_id",
            get(handlers::product::get_product)
                .patch(handlers::product::update_product)
                .delete(handlers::product::deactivate_product),
        )
}

fn customer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::customer::list_customers).post(handlers::customer::register_customer),
        )
        .route("/:customer_id", get(handlers::customer::get_customer))
        .route(
            "/:customer_id/purchases",
            get(handlers::customer::purchase_history),
        )
}

fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::purchase::list_purchases).post(handlers::purchase::open_purchase),
        )
        .route("/open", get(handlers::purchase::get_open_purchase))
        .route(
            "/:purchase_id",
            get(handlers::purchase::get_purchase).delete(handlers::purchase::cancel_purchase),
        )
        .route(
            "/:purchase_id/summary",
            get(handlers::purchase::purchase_summary),
        )
        .route(
            "/:purchase_id/items",
            get(handlers::purchase::list_items).post(handlers::purchase::add_item),
        )
        .route(
            "/:purchase_id/items/:item_id",
            patch(handlers::purchase::update_item_price).delete(handlers::purchase::delete_item),
        )
        .route("/:purchase_id/pay", post(handlers::purchase::pay_purchase))
        .route("/:purchase_id/payment", get(handlers::purchase::get_payment))
}

fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(handlers::inventory::list_inventory))
        .route(
            "/products/:product_id/balance",
            get(handlers::inventory::get_balance),
        )
        .route(
            "/products/:product_id/ledger",
            post(handlers::inventory::ensure_ledger_entry),
        )
        .route("/sell", post(handlers::inventory::sell_batch))
        .route("/sales", get(handlers::inventory::list_sales))
        .route(
            "/sales/:event_id",
            delete(handlers::inventory::delete_sale_event),
        )
}
