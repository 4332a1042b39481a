//! Domain models for the Scrap Shop POS

pub mod inventory;
pub mod payment;
pub mod purchase;

pub use inventory::*;
pub use payment::*;
pub use purchase::*;
