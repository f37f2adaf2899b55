use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use provia_core::CoreError;
use provia_order::OrderError;
use provia_requisition::RequisitionError;
use provia_stock::StockError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            },
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            },
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => Self::ValidationError(msg),
            CoreError::NotFound(msg) => Self::NotFoundError(msg),
            CoreError::Conflict(msg) => Self::ConflictError(msg),
            CoreError::Storage(msg) => Self::InternalServerError(msg),
        }
    }
}

impl From<StockError> for AppError {
    fn from(err: StockError) -> Self {
        match err {
            StockError::ItemNotFound(_) => Self::NotFoundError(err.to_string()),
            StockError::Validation(_) => Self::ValidationError(err.to_string()),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(_) => Self::NotFoundError(err.to_string()),
            OrderError::Validation(_) | OrderError::InvalidTransition { .. } => {
                Self::ValidationError(err.to_string())
            },
        }
    }
}

impl From<RequisitionError> for AppError {
    fn from(err: RequisitionError) -> Self {
        match err {
            RequisitionError::NotFound(_) => Self::NotFoundError(err.to_string()),
            RequisitionError::Validation(_)
            | RequisitionError::InvalidTransition { .. }
            | RequisitionError::InsufficientStock { .. } => Self::ValidationError(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}
