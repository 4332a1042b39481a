//! Shared types and domain logic for the Scrap Shop POS
//!
//! This crate contains the pure parts of the inventory core: purchase
//! lifecycle states, ledger balance arithmetic, sale batch aggregation and
//! the price rounding rules. The backend builds its transaction scripts on
//! top of these; tests exercise them directly.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
