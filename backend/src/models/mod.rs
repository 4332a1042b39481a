//! Database models for the Scrap Shop POS backend
//!
//! Re-exports models from the shared crate; row types returned by queries
//! live next to the services that produce them.

pub use shared::models::*;
