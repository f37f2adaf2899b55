pub mod app_config;
pub mod database;
pub mod events;
pub mod memory;
pub mod order_repo;
pub mod registry_repo;
pub mod requisition_repo;
pub mod stock_repo;

pub use database::DbClient;
pub use events::{EngineEvent, EventBus};
pub use memory::MemoryStore;
pub use order_repo::PgOrderRepository;
pub use registry_repo::{PgBuyerDirectory, PgCatalogStore};
pub use requisition_repo::PgRequisitionRepository;
pub use stock_repo::PgStockRepository;

use provia_core::CoreError;

/// Map driver errors onto the engine taxonomy. Unique-key violations are
/// conflicts; everything else is an opaque storage failure.
pub(crate) fn map_sqlx_err(err: sqlx::Error) -> CoreError {
    match &err {
        sqlx::Error::RowNotFound => CoreError::NotFound("row not found".to_string()),
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            CoreError::Conflict(db.message().to_string())
        }
        _ => CoreError::Storage(err.to_string()),
    }
}
