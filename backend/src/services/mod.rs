//! Business logic services for the Scrap Shop POS backend

pub mod category;
pub mod customer;
pub mod inventory;
pub mod ledger;
pub mod payment;
pub mod purchase;
pub mod purchase_item;
pub mod product;
pub mod stock_sale;

pub use category::CategoryService;
pub use customer::CustomerService;
pub use inventory::InventoryService;
pub use ledger::LedgerService;
pub use payment::PaymentService;
pub use purchase::PurchaseService;
pub use purchase_item::PurchaseItemService;
pub use product::ProductService;
pub use stock_sale::StockSaleService;
