use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct RequisitionCreatedEvent {
    pub requisition_id: Uuid,
    pub buyer_id: Uuid,
    pub number: i64,
    pub origin_sector: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct RequisitionUpdatedEvent {
    pub requisition_id: Uuid,
    pub buyer_id: Uuid,
    pub status: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderApprovedEvent {
    pub order_id: Uuid,
    pub buyer: String,
    pub supplier: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderReceivedEvent {
    pub order_id: Uuid,
    pub buyer: String,
    pub supplier: String,
    pub timestamp: i64,
}
