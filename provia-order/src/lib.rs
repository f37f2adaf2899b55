pub mod lifecycle;
pub mod models;

pub use lifecycle::{
    apply_approve, apply_receive, approve_fires, create_order, rate, remove_line, CreateOrder,
    LineInput, RemoveLineOutcome,
};
pub use models::{Order, OrderLine, OrderStatus, Rating};

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Invalid order: {0}")]
    Validation(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}
