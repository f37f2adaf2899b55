use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use provia_requisition::models::{Priority, Requisition, RequisitionLine, RequisitionStatus};
use provia_requisition::workflow::{
    available_items, fulfill, transition, validate_link_submission, AvailableItem,
};
use provia_shared::models::events::{RequisitionCreatedEvent, RequisitionUpdatedEvent};
use provia_stock::models::DEFAULT_UNIT;
use provia_store::EngineEvent;

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/requisitions", post(create).get(list))
        .route("/requisitions/{id}", get(find))
        .route("/requisitions/{id}/status", patch(update_status))
        .route("/requisitions/link", post(submit_by_link))
        .route("/requisitions/link/{token}/stock", get(link_stock))
}

#[derive(Debug, Deserialize)]
struct LineBody {
    name: String,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    quantity: i64,
}

fn collect_lines(lines: Vec<LineBody>) -> Vec<RequisitionLine> {
    lines
        .into_iter()
        .filter(|l| !l.name.trim().is_empty() && l.quantity > 0)
        .map(|l| RequisitionLine {
            name: l.name.trim().to_string(),
            unit: l
                .unit
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .unwrap_or(DEFAULT_UNIT)
                .to_string(),
            quantity: l.quantity,
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct CreateRequisitionRequest {
    buyer_id: Uuid,
    origin_sector: String,
    requested_by: String,
    #[serde(default)]
    priority: Option<Priority>,
    #[serde(default)]
    notes: Option<String>,
    lines: Vec<LineBody>,
}

async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateRequisitionRequest>,
) -> Result<(StatusCode, Json<Requisition>), AppError> {
    let origin_sector = body.origin_sector.trim().to_string();
    let requested_by = body.requested_by.trim().to_string();
    if origin_sector.is_empty() || requested_by.is_empty() {
        return Err(AppError::ValidationError(
            "origin sector and requester are required".to_string(),
        ));
    }
    let lines = collect_lines(body.lines);
    if lines.is_empty() {
        return Err(AppError::ValidationError("no valid lines".to_string()));
    }

    let now = Utc::now();
    let number = state.requisition_repo.next_number(body.buyer_id).await?;
    let requisition = Requisition {
        id: Uuid::new_v4(),
        buyer_id: body.buyer_id,
        number,
        origin_sector,
        requested_by,
        priority: body.priority.unwrap_or_default(),
        notes: body.notes.unwrap_or_default(),
        lines,
        status: RequisitionStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    state.requisition_repo.insert(&requisition).await?;

    state
        .events
        .publish(EngineEvent::RequisitionCreated(RequisitionCreatedEvent {
            requisition_id: requisition.id,
            buyer_id: requisition.buyer_id,
            number: requisition.number,
            origin_sector: requisition.origin_sector.clone(),
            timestamp: now.timestamp(),
        }));
    tracing::info!(requisition_id = %requisition.id, number, "requisition created");

    Ok((StatusCode::CREATED, Json(requisition)))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    buyer_id: Uuid,
    sector: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Requisition>>, AppError> {
    let requisitions = state
        .requisition_repo
        .list(params.buyer_id, params.sector.as_deref())
        .await?;
    Ok(Json(requisitions))
}

async fn find(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Requisition>, AppError> {
    let requisition = load_requisition(&state, id).await?;
    Ok(Json(requisition))
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    status: RequisitionStatus,
}

/// Guarded status transition. Moving into Fulfilled deducts each line from
/// the buyer's on-hand stock, clamped at zero.
async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Requisition>, AppError> {
    let mut requisition = load_requisition(&state, id).await?;
    let now = Utc::now();
    transition(&mut requisition, body.status, now)?;

    // The closed requisition is persisted before the stock deduction: a
    // failed deduction cannot be retried into a double decrement once the
    // transition out of IN_SEPARATION is recorded.
    state.requisition_repo.update(&requisition).await?;

    if body.status == RequisitionStatus::Fulfilled {
        match state.stock_repo.find_by_buyer(requisition.buyer_id).await? {
            Some(mut stock) => {
                let version = stock.version;
                fulfill(&requisition, &mut stock, now);
                state.stock_repo.save(&stock, version).await?;
            }
            None => {
                tracing::warn!(requisition_id = %id, "no stock record to deduct from");
            }
        }
    }

    state
        .events
        .publish(EngineEvent::RequisitionUpdated(RequisitionUpdatedEvent {
            requisition_id: requisition.id,
            buyer_id: requisition.buyer_id,
            status: requisition.status.to_string(),
            timestamp: now.timestamp(),
        }));

    Ok(Json(requisition))
}

/// Shareable-link token: the base64 of the buyer's account id.
pub fn link_token(buyer_id: Uuid) -> String {
    BASE64.encode(buyer_id.to_string())
}

fn decode_token(token: &str) -> Result<Uuid, AppError> {
    let invalid = || AppError::ValidationError("invalid link".to_string());
    let bytes = BASE64.decode(token.trim()).map_err(|_| invalid())?;
    let text = String::from_utf8(bytes).map_err(|_| invalid())?;
    Uuid::parse_str(text.trim()).map_err(|_| invalid())
}

#[derive(Debug, Deserialize)]
struct LinkSubmission {
    token: String,
    #[serde(default)]
    origin_sector: Option<String>,
    #[serde(default)]
    requested_by: Option<String>,
    lines: Vec<LineBody>,
}

/// Public submission through a shared link. Every requested quantity must be
/// covered by on-hand stock at submission time.
async fn submit_by_link(
    State(state): State<AppState>,
    Json(body): Json<LinkSubmission>,
) -> Result<(StatusCode, Json<Requisition>), AppError> {
    let buyer_id = decode_token(&body.token)?;
    let lines = collect_lines(body.lines);

    let stock = state
        .stock_repo
        .find_by_buyer(buyer_id)
        .await?
        .ok_or_else(|| AppError::ValidationError("stock record not found".to_string()))?;
    validate_link_submission(&lines, &stock)?;

    let now = Utc::now();
    let number = state.requisition_repo.next_number(buyer_id).await?;
    let requisition = Requisition {
        id: Uuid::new_v4(),
        buyer_id,
        number,
        origin_sector: body
            .origin_sector
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Link submission".to_string()),
        requested_by: body
            .requested_by
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Link submission".to_string()),
        priority: Priority::Normal,
        notes: String::new(),
        lines,
        status: RequisitionStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    state.requisition_repo.insert(&requisition).await?;

    state
        .events
        .publish(EngineEvent::RequisitionCreated(RequisitionCreatedEvent {
            requisition_id: requisition.id,
            buyer_id,
            number: requisition.number,
            origin_sector: requisition.origin_sector.clone(),
            timestamp: now.timestamp(),
        }));

    Ok((StatusCode::CREATED, Json(requisition)))
}

/// Stock view for the link page: only items with something on hand.
async fn link_stock(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<Vec<AvailableItem>>, AppError> {
    let buyer_id = decode_token(&token)?;
    let items = match state.stock_repo.find_by_buyer(buyer_id).await? {
        Some(stock) => available_items(&stock),
        None => Vec::new(),
    };
    Ok(Json(items))
}

async fn load_requisition(state: &AppState, id: Uuid) -> Result<Requisition, AppError> {
    state
        .requisition_repo
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("requisition not found".to_string()))
}
