use tokio::sync::broadcast;

use provia_shared::models::events::{
    OrderApprovedEvent, OrderReceivedEvent, RequisitionCreatedEvent, RequisitionUpdatedEvent,
};

#[derive(Debug, Clone)]
pub enum EngineEvent {
    RequisitionCreated(RequisitionCreatedEvent),
    RequisitionUpdated(RequisitionUpdatedEvent),
    OrderApproved(OrderApprovedEvent),
    OrderReceived(OrderReceivedEvent),
}

/// In-process fan-out of domain events. Delivery to external channels is the
/// notification collaborator's job; this bus only publishes.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// A send with no live subscribers is not an error.
    pub fn publish(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
