use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use provia_order::lifecycle::{
    apply_approve, apply_receive, approve_fires, create_order, rate, remove_line, CreateOrder,
    LineInput, RemoveLineOutcome,
};
use provia_order::models::{Order, OrderLine, OrderStatus};
use provia_shared::models::events::{OrderApprovedEvent, OrderReceivedEvent};
use provia_stock::models::{StockRecord, DEFAULT_UNIT};
use provia_store::EngineEvent;

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create).get(list))
        .route("/orders/{id}", get(find).put(update).delete(remove))
        .route("/orders/{id}/approve", post(approve))
        .route("/orders/{id}/receive", post(receive))
        .route("/orders/{id}/rate", post(rate_order))
        .route("/orders/{id}/lines/{line_id}", delete(remove_order_line))
}

async fn create(
    State(state): State<AppState>,
    Json(cmd): Json<CreateOrder>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let order = create_order(cmd, Utc::now())?;
    state.order_repo.insert(&order).await?;
    tracing::info!(order_id = %order.id, supplier = %order.supplier, "order created");
    Ok((StatusCode::CREATED, Json(order)))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    buyer: Option<String>,
    supplier: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = state
        .order_repo
        .list(params.buyer.as_deref(), params.supplier.as_deref())
        .await?;
    Ok(Json(orders))
}

async fn find(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = load_order(&state, id).await?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
struct UpdateOrderRequest {
    supplier: Option<String>,
    lines: Option<Vec<LineInput>>,
    total: Option<f64>,
    status: Option<OrderStatus>,
    notes: Option<String>,
    delivery_date: Option<DateTime<Utc>>,
}

/// Generic patch. A status change that crosses into Approved runs the same
/// stock side effect as the dedicated approve action, exactly once.
async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    let mut order = load_order(&state, id).await?;
    let previous = order.status;
    let now = Utc::now();

    if let Some(supplier) = patch.supplier {
        let supplier = supplier.trim().to_string();
        if supplier.is_empty() {
            return Err(AppError::ValidationError(
                "supplier cannot be blank".to_string(),
            ));
        }
        order.supplier = supplier;
    }
    if let Some(lines) = patch.lines {
        order.lines = lines
            .into_iter()
            .filter(|l| !l.name.trim().is_empty() && l.quantity > 0)
            .map(|l| OrderLine {
                id: Uuid::new_v4(),
                name: l.name.trim().to_string(),
                unit: l
                    .unit
                    .as_deref()
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .unwrap_or(DEFAULT_UNIT)
                    .to_string(),
                quantity: l.quantity,
                unit_price: l.unit_price,
            })
            .collect();
        if order.lines.is_empty() {
            return Err(AppError::ValidationError(
                "an order needs at least one line".to_string(),
            ));
        }
        order.total = Order::computed_total(&order.lines);
    }
    if let Some(total) = patch.total {
        if total.is_finite() && total > 0.0 {
            order.total = total;
        }
    }
    if let Some(notes) = patch.notes {
        order.notes = notes;
    }
    if let Some(delivery_date) = patch.delivery_date {
        order.delivery_date = Some(delivery_date);
    }

    match patch.status {
        Some(next) if approve_fires(previous, next) => {
            fire_approve(&state, &mut order, now).await?;
        }
        Some(next) => {
            order.status = next;
            order.updated_at = now;
        }
        None => {
            order.updated_at = now;
        }
    }

    state.order_repo.update(&order).await?;
    Ok(Json(order))
}

/// Dedicated approve action.
async fn approve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let mut order = load_order(&state, id).await?;
    if !approve_fires(order.status, OrderStatus::Approved)
        || order.status == OrderStatus::Completed
    {
        return Err(AppError::ValidationError(format!(
            "cannot approve an order in status {}",
            order.status
        )));
    }

    fire_approve(&state, &mut order, Utc::now()).await?;
    state.order_repo.update(&order).await?;
    Ok(Json(order))
}

/// Approval side effect: line quantities join the buyer's in-transit count.
/// A buyer reference the directory cannot resolve skips the stock mutation
/// but still advances the order status.
async fn fire_approve(
    state: &AppState,
    order: &mut Order,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    match state.buyers.resolve_buyer(&order.buyer).await? {
        Some(buyer_id) => {
            match state.stock_repo.find_by_buyer(buyer_id).await? {
                Some(mut stock) => {
                    let version = stock.version;
                    apply_approve(order, &mut stock, now);
                    state.stock_repo.save(&stock, version).await?;
                }
                None => {
                    let mut stock = StockRecord::new(buyer_id);
                    apply_approve(order, &mut stock, now);
                    state.stock_repo.insert(&stock).await?;
                }
            }
            state.events.publish(EngineEvent::OrderApproved(OrderApprovedEvent {
                order_id: order.id,
                buyer: order.buyer.clone(),
                supplier: order.supplier.clone(),
                timestamp: now.timestamp(),
            }));
        }
        None => {
            tracing::warn!(order_id = %order.id, buyer = %order.buyer, "buyer not resolved, approving without stock update");
            order.status = OrderStatus::Approved;
            order.approved_at = Some(now);
            order.updated_at = now;
        }
    }
    Ok(())
}

async fn receive(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let mut order = load_order(&state, id).await?;
    if order.status != OrderStatus::Approved {
        return Err(AppError::ValidationError(
            "only an approved order can be received".to_string(),
        ));
    }

    let buyer_id = state
        .buyers
        .resolve_buyer(&order.buyer)
        .await?
        .ok_or_else(|| {
            AppError::ValidationError("order buyer could not be resolved".to_string())
        })?;
    let mut stock = state
        .stock_repo
        .find_by_buyer(buyer_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFoundError("stock record not found for the order's buyer".to_string())
        })?;

    let now = Utc::now();
    let version = stock.version;
    apply_receive(&mut order, &mut stock, now)?;
    state.stock_repo.save(&stock, version).await?;
    state.order_repo.update(&order).await?;

    state.events.publish(EngineEvent::OrderReceived(OrderReceivedEvent {
        order_id: order.id,
        buyer: order.buyer.clone(),
        supplier: order.supplier.clone(),
        timestamp: now.timestamp(),
    }));
    tracing::info!(order_id = %order.id, "order received");

    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
struct RateRequest {
    score: i32,
    #[serde(default)]
    comment: String,
}

async fn rate_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RateRequest>,
) -> Result<Json<Order>, AppError> {
    let mut order = load_order(&state, id).await?;
    rate(&mut order, body.score, &body.comment, Utc::now());
    state.order_repo.update(&order).await?;
    Ok(Json(order))
}

async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let order = load_order(&state, id).await?;
    if !order.can_delete() {
        return Err(AppError::ValidationError(
            "only draft or sent orders can be deleted".to_string(),
        ));
    }
    state.order_repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Removing the last line deletes the whole order.
async fn remove_order_line(
    State(state): State<AppState>,
    Path((id, line_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, AppError> {
    let mut order = load_order(&state, id).await?;
    match remove_line(&mut order, line_id, Utc::now()) {
        RemoveLineOutcome::Updated => {
            state.order_repo.update(&order).await?;
            Ok(Json(order).into_response())
        }
        RemoveLineOutcome::Empty => {
            state.order_repo.delete(id).await?;
            Ok(StatusCode::NO_CONTENT.into_response())
        }
    }
}

async fn load_order(state: &AppState, id: Uuid) -> Result<Order, AppError> {
    state
        .order_repo
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("order not found".to_string()))
}
