//! Scrap Shop POS backend
//!
//! Point-of-sale and inventory tracker for a scrap-buying shop: staff weigh
//! and price incoming items into an open purchase bill, close it with a
//! payment, and later resell accumulated stock. The inventory ledger keeps
//! per-product purchased/sold running totals consistent under concurrent
//! writers.
//!
//! The binary in `main.rs` wires this library to a socket; integration
//! tests drive the services against a throwaway database directly.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use config::Config;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Scrap Shop POS API v1.0"
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
