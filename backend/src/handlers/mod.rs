//! HTTP request handlers for the Scrap Shop POS backend

pub mod category;
pub mod customer;
pub mod inventory;
pub mod product;
pub mod purchase;
