use async_trait::async_trait;
use uuid::Uuid;

use crate::CoreResult;
use provia_order::Order;
use provia_requisition::Requisition;
use provia_stock::{CatalogItem, StockRecord};

/// Per-buyer stock document access. `save` is a compare-and-swap against the
/// version the record was read at, so concurrent read-mutate-write cycles on
/// the same buyer surface as a Conflict instead of silently losing one.
#[async_trait]
pub trait StockRepository: Send + Sync {
    async fn find_by_buyer(&self, buyer_id: Uuid) -> CoreResult<Option<StockRecord>>;

    /// Insert a fresh record. A second record for the same buyer is a
    /// Conflict (one stock document per buyer).
    async fn insert(&self, record: &StockRecord) -> CoreResult<()>;

    /// Whole-document replace guarded by `expected_version`; returns the new
    /// version on success.
    async fn save(&self, record: &StockRecord, expected_version: u64) -> CoreResult<u64>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: &Order) -> CoreResult<()>;
    async fn find(&self, id: Uuid) -> CoreResult<Option<Order>>;
    /// Newest first, optionally filtered by buyer and/or supplier reference.
    async fn list(&self, buyer: Option<&str>, supplier: Option<&str>) -> CoreResult<Vec<Order>>;
    async fn update(&self, order: &Order) -> CoreResult<()>;
    async fn delete(&self, id: Uuid) -> CoreResult<()>;
}

#[async_trait]
pub trait RequisitionRepository: Send + Sync {
    async fn insert(&self, requisition: &Requisition) -> CoreResult<()>;
    async fn find(&self, id: Uuid) -> CoreResult<Option<Requisition>>;
    /// Newest first for one buyer, optionally filtered by origin sector.
    async fn list(&self, buyer_id: Uuid, sector: Option<&str>) -> CoreResult<Vec<Requisition>>;
    async fn update(&self, requisition: &Requisition) -> CoreResult<()>;
    /// Atomically allocate the next per-buyer requisition number.
    async fn next_number(&self, buyer_id: Uuid) -> CoreResult<i64>;
}

/// Read-only view of the catalog collaborator.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_catalog(&self, buyer_id: Uuid) -> CoreResult<Vec<CatalogItem>>;
}

/// Resolves a free-form buyer reference (account id or company name) to a
/// stock-owning account, when one exists.
#[async_trait]
pub trait BuyerDirectory: Send + Sync {
    async fn resolve_buyer(&self, reference: &str) -> CoreResult<Option<Uuid>>;
}
