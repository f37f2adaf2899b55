pub mod models;
pub mod ops;
pub mod replenish;
pub mod sync;

pub use models::{CatalogItem, LastReceipt, StockItem, StockRecord};
pub use ops::{Receipt, ReceiptPolicy};
pub use replenish::{advise, ReplenishmentAdvice};
pub use sync::{synchronize, SyncOutcome};

#[derive(Debug, thiserror::Error)]
pub enum StockError {
    #[error("Stock item not found: {0}")]
    ItemNotFound(String),

    #[error("Invalid stock input: {0}")]
    Validation(String),
}
