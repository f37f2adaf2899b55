use std::sync::Arc;

use provia_core::repository::{
    BuyerDirectory, CatalogStore, OrderRepository, RequisitionRepository, StockRepository,
};
use provia_store::EventBus;

#[derive(Clone)]
pub struct AppState {
    pub stock_repo: Arc<dyn StockRepository>,
    pub order_repo: Arc<dyn OrderRepository>,
    pub requisition_repo: Arc<dyn RequisitionRepository>,
    pub catalogs: Arc<dyn CatalogStore>,
    pub buyers: Arc<dyn BuyerDirectory>,
    pub events: EventBus,
}
