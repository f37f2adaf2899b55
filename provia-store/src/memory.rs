use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use provia_core::identity::BuyerRef;
use provia_core::repository::{
    BuyerDirectory, CatalogStore, OrderRepository, RequisitionRepository, StockRepository,
};
use provia_core::{CoreError, CoreResult};
use provia_order::Order;
use provia_requisition::Requisition;
use provia_stock::{CatalogItem, StockRecord};

/// In-memory implementation of every repository trait, with the same
/// semantics as the Postgres store (unique buyer key, version CAS, atomic
/// counters). Backs the API integration tests.
#[derive(Default)]
pub struct MemoryStore {
    stocks: RwLock<HashMap<Uuid, StockRecord>>,
    orders: RwLock<HashMap<Uuid, Order>>,
    requisitions: RwLock<HashMap<Uuid, Requisition>>,
    catalogs: RwLock<HashMap<Uuid, Vec<CatalogItem>>>,
    buyers: RwLock<HashMap<Uuid, String>>,
    counters: RwLock<HashMap<Uuid, i64>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn set_catalog(&self, buyer_id: Uuid, items: Vec<CatalogItem>) {
        self.catalogs.write().await.insert(buyer_id, items);
    }

    pub async fn register_buyer(&self, buyer_id: Uuid, name: &str) {
        self.buyers.write().await.insert(buyer_id, name.to_string());
    }
}

#[async_trait]
impl StockRepository for MemoryStore {
    async fn find_by_buyer(&self, buyer_id: Uuid) -> CoreResult<Option<StockRecord>> {
        Ok(self.stocks.read().await.get(&buyer_id).cloned())
    }

    async fn insert(&self, record: &StockRecord) -> CoreResult<()> {
        let mut stocks = self.stocks.write().await;
        if stocks.contains_key(&record.buyer_id) {
            return Err(CoreError::Conflict(format!(
                "stock record already exists for buyer {}",
                record.buyer_id
            )));
        }
        let mut stored = record.clone();
        stored.version = 0;
        stocks.insert(record.buyer_id, stored);
        Ok(())
    }

    async fn save(&self, record: &StockRecord, expected_version: u64) -> CoreResult<u64> {
        let mut stocks = self.stocks.write().await;
        let Some(stored) = stocks.get_mut(&record.buyer_id) else {
            return Err(CoreError::NotFound(format!(
                "stock record for buyer {}",
                record.buyer_id
            )));
        };
        if stored.version != expected_version {
            return Err(CoreError::Conflict(format!(
                "stock record for buyer {} changed underneath version {}",
                record.buyer_id, expected_version
            )));
        }
        stored.items = record.items.clone();
        stored.version += 1;
        Ok(stored.version)
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn insert(&self, order: &Order) -> CoreResult<()> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list(&self, buyer: Option<&str>, supplier: Option<&str>) -> CoreResult<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut matched: Vec<Order> = orders
            .values()
            .filter(|o| buyer.is_none_or(|b| o.buyer == b))
            .filter(|o| supplier.is_none_or(|s| o.supplier == s))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn update(&self, order: &Order) -> CoreResult<()> {
        let mut orders = self.orders.write().await;
        if !orders.contains_key(&order.id) {
            return Err(CoreError::NotFound(format!("order {}", order.id)));
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> CoreResult<()> {
        if self.orders.write().await.remove(&id).is_none() {
            return Err(CoreError::NotFound(format!("order {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl RequisitionRepository for MemoryStore {
    async fn insert(&self, requisition: &Requisition) -> CoreResult<()> {
        self.requisitions
            .write()
            .await
            .insert(requisition.id, requisition.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Requisition>> {
        Ok(self.requisitions.read().await.get(&id).cloned())
    }

    async fn list(&self, buyer_id: Uuid, sector: Option<&str>) -> CoreResult<Vec<Requisition>> {
        let requisitions = self.requisitions.read().await;
        let mut matched: Vec<Requisition> = requisitions
            .values()
            .filter(|r| r.buyer_id == buyer_id)
            .filter(|r| sector.is_none_or(|s| r.origin_sector == s))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn update(&self, requisition: &Requisition) -> CoreResult<()> {
        let mut requisitions = self.requisitions.write().await;
        if !requisitions.contains_key(&requisition.id) {
            return Err(CoreError::NotFound(format!(
                "requisition {}",
                requisition.id
            )));
        }
        requisitions.insert(requisition.id, requisition.clone());
        Ok(())
    }

    async fn next_number(&self, buyer_id: Uuid) -> CoreResult<i64> {
        let mut counters = self.counters.write().await;
        let counter = counters.entry(buyer_id).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn get_catalog(&self, buyer_id: Uuid) -> CoreResult<Vec<CatalogItem>> {
        Ok(self
            .catalogs
            .read()
            .await
            .get(&buyer_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl BuyerDirectory for MemoryStore {
    async fn resolve_buyer(&self, reference: &str) -> CoreResult<Option<Uuid>> {
        let Some(buyer_ref) = BuyerRef::parse(reference) else {
            return Ok(None);
        };
        let buyers = self.buyers.read().await;
        Ok(match buyer_ref {
            BuyerRef::Id(id) => buyers.contains_key(&id).then_some(id),
            BuyerRef::Name(name) => buyers
                .iter()
                .find(|(_, n)| **n == name)
                .map(|(id, _)| *id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provia_stock::StockItem;

    #[tokio::test]
    async fn test_stock_insert_is_unique_per_buyer() {
        let store = MemoryStore::new();
        let record = StockRecord::new(Uuid::new_v4());

        StockRepository::insert(store.as_ref(), &record).await.unwrap();
        let err = StockRepository::insert(store.as_ref(), &record)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_stale_save_is_a_conflict() {
        let store = MemoryStore::new();
        let mut record = StockRecord::new(Uuid::new_v4());
        StockRepository::insert(store.as_ref(), &record).await.unwrap();

        record.items.push(StockItem::zeroed("Rice", "kg"));
        let version = store.save(&record, 0).await.unwrap();
        assert_eq!(version, 1);

        // A writer still holding version 0 must not overwrite.
        let err = store.save(&record, 0).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_requisition_numbers_are_sequential_per_buyer() {
        let store = MemoryStore::new();
        let buyer_a = Uuid::new_v4();
        let buyer_b = Uuid::new_v4();

        assert_eq!(store.next_number(buyer_a).await.unwrap(), 1);
        assert_eq!(store.next_number(buyer_a).await.unwrap(), 2);
        assert_eq!(store.next_number(buyer_b).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_buyer_resolution_by_id_or_name() {
        let store = MemoryStore::new();
        let buyer_id = Uuid::new_v4();
        store.register_buyer(buyer_id, "Restaurante Vista").await;

        assert_eq!(
            store.resolve_buyer(&buyer_id.to_string()).await.unwrap(),
            Some(buyer_id)
        );
        assert_eq!(
            store.resolve_buyer("Restaurante Vista").await.unwrap(),
            Some(buyer_id)
        );
        assert_eq!(store.resolve_buyer("Unknown Co").await.unwrap(), None);
    }
}
