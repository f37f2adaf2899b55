pub mod models;
pub mod workflow;

pub use models::{Priority, Requisition, RequisitionLine, RequisitionStatus};
pub use workflow::{
    available_items, can_transition, fulfill, transition, validate_link_submission, AvailableItem,
};

#[derive(Debug, thiserror::Error)]
pub enum RequisitionError {
    #[error("Requisition not found: {0}")]
    NotFound(String),

    #[error("Invalid requisition: {0}")]
    Validation(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Requested quantity of \"{name}\" exceeds the {available} available in stock")]
    InsufficientStock { name: String, available: i64 },
}
