use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use provia_stock::models::{StockItem, StockRecord};
use provia_stock::ops::{
    register_receipt, save_full_snapshot, submit_physical_count, upsert_item, CountEntry, Receipt,
    ReceiptPolicy, SnapshotItem,
};
use provia_stock::replenish::{advise, ReplenishmentAdvice};
use provia_stock::sync::{merge_missing, synchronize};

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stock/{buyer_id}", get(get_stock).post(save_stock))
        .route("/stock/{buyer_id}/receipt", post(book_receipt))
        .route("/stock/{buyer_id}/count", post(submit_count))
        .route("/stock/{buyer_id}/sync", post(sync_catalog))
        .route("/stock/{buyer_id}/items", put(put_item))
        .route("/stock/{buyer_id}/replenishment", get(replenishment))
}

/// Read with lazy bootstrap: a missing record is created from the buyer's
/// catalog; an existing one is reconciled against the catalog and persisted
/// only when the reconciliation changed something.
async fn get_stock(
    State(state): State<AppState>,
    Path(buyer_id): Path<Uuid>,
) -> Result<Json<Vec<StockItem>>, AppError> {
    let catalog = state.catalogs.get_catalog(buyer_id).await?;

    match state.stock_repo.find_by_buyer(buyer_id).await? {
        Some(record) => {
            let outcome = synchronize(&catalog, &record.items);
            if outcome.changed {
                let synced = StockRecord {
                    buyer_id,
                    items: outcome.items.clone(),
                    version: record.version,
                };
                state.stock_repo.save(&synced, record.version).await?;
                tracing::info!(%buyer_id, "stock reconciled against catalog");
            }
            Ok(Json(outcome.items))
        }
        None if catalog.is_empty() => Err(AppError::NotFoundError(
            "no stock record or catalog for this buyer".to_string(),
        )),
        None => {
            let record = StockRecord::from_catalog(buyer_id, &catalog);
            state.stock_repo.insert(&record).await?;
            tracing::info!(%buyer_id, items = record.items.len(), "stock record bootstrapped");
            Ok(Json(record.items))
        }
    }
}

#[derive(Debug, Deserialize)]
struct SaveStockRequest {
    items: Vec<SnapshotItem>,
}

#[derive(Debug, Serialize)]
struct SaveStockResponse {
    message: String,
    total: usize,
}

/// Whole-snapshot save. In-transit quantities are carried over from the
/// stored record, never taken from the payload.
async fn save_stock(
    State(state): State<AppState>,
    Path(buyer_id): Path<Uuid>,
    Json(body): Json<SaveStockRequest>,
) -> Result<Json<SaveStockResponse>, AppError> {
    let prior = state.stock_repo.find_by_buyer(buyer_id).await?;
    let items = save_full_snapshot(prior.as_ref(), &body.items);
    let total = items.len();

    match prior {
        Some(existing) => {
            let record = StockRecord {
                buyer_id,
                items,
                version: existing.version,
            };
            state.stock_repo.save(&record, existing.version).await?;
        }
        None => {
            let record = StockRecord {
                buyer_id,
                items,
                version: 0,
            };
            state.stock_repo.insert(&record).await?;
        }
    }

    Ok(Json(SaveStockResponse {
        message: "stock saved".to_string(),
        total,
    }))
}

#[derive(Debug, Deserialize)]
struct ReceiptParams {
    #[serde(default)]
    create_missing: bool,
}

/// Strict by default: a receipt for an untracked product is a 404.
/// `?create_missing=true` creates the item on the fly instead.
async fn book_receipt(
    State(state): State<AppState>,
    Path(buyer_id): Path<Uuid>,
    Query(params): Query<ReceiptParams>,
    Json(receipt): Json<Receipt>,
) -> Result<Json<Vec<StockItem>>, AppError> {
    let mut record = state
        .stock_repo
        .find_by_buyer(buyer_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("stock record not found".to_string()))?;

    let policy = if params.create_missing {
        ReceiptPolicy::CreateMissing
    } else {
        ReceiptPolicy::Strict
    };
    let version = record.version;
    register_receipt(&mut record, &receipt, policy, Utc::now())?;
    state.stock_repo.save(&record, version).await?;

    Ok(Json(record.items))
}

#[derive(Debug, Deserialize)]
struct CountRequest {
    items: Vec<CountEntry>,
}

async fn submit_count(
    State(state): State<AppState>,
    Path(buyer_id): Path<Uuid>,
    Json(body): Json<CountRequest>,
) -> Result<Json<Vec<StockItem>>, AppError> {
    let mut record = state
        .stock_repo
        .find_by_buyer(buyer_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("stock record not found".to_string()))?;

    let version = record.version;
    submit_physical_count(&mut record, &body.items, Utc::now());
    state.stock_repo.save(&record, version).await?;

    Ok(Json(record.items))
}

#[derive(Debug, Serialize)]
struct SyncResponse {
    message: String,
    added: usize,
    total: usize,
}

/// Append-only catalog merge: items already tracked keep their quantities,
/// catalog newcomers are appended at zero. Nothing is removed.
async fn sync_catalog(
    State(state): State<AppState>,
    Path(buyer_id): Path<Uuid>,
) -> Result<Json<SyncResponse>, AppError> {
    let catalog = state.catalogs.get_catalog(buyer_id).await?;
    if catalog.is_empty() {
        return Err(AppError::NotFoundError(
            "catalog not found or empty".to_string(),
        ));
    }

    match state.stock_repo.find_by_buyer(buyer_id).await? {
        Some(mut record) => {
            let version = record.version;
            let added = merge_missing(&catalog, &mut record.items);
            if added > 0 {
                state.stock_repo.save(&record, version).await?;
            }
            Ok(Json(SyncResponse {
                message: "stock synchronized".to_string(),
                added,
                total: record.items.len(),
            }))
        }
        None => {
            let record = StockRecord::from_catalog(buyer_id, &catalog);
            state.stock_repo.insert(&record).await?;
            let total = record.items.len();
            Ok(Json(SyncResponse {
                message: "stock record created".to_string(),
                added: total,
                total,
            }))
        }
    }
}

/// Item-level upsert. The in-transit quantity is preserved from the stored
/// item when present, 0 otherwise.
async fn put_item(
    State(state): State<AppState>,
    Path(buyer_id): Path<Uuid>,
    Json(body): Json<SnapshotItem>,
) -> Result<Json<Vec<StockItem>>, AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::ValidationError(
            "item name is required".to_string(),
        ));
    }

    let mut record = state
        .stock_repo
        .find_by_buyer(buyer_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("stock record not found".to_string()))?;

    let version = record.version;
    let in_transit = record
        .find_item(&body.name)
        .map(|i| i.quantity_in_transit)
        .unwrap_or(0);
    let unit = body
        .unit
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(provia_stock::models::DEFAULT_UNIT);
    let item = StockItem {
        name: body.name.trim().to_string(),
        unit: unit.to_string(),
        quantity_on_hand: body.quantity_on_hand.max(0),
        minimum: body.minimum.max(0),
        maximum: body.maximum.max(0),
        quantity_in_transit: in_transit,
        physical_count: body.physical_count.max(0),
        last_update: Some(Utc::now()),
        last_receipt: body.last_receipt,
    };
    upsert_item(&mut record, item);
    state.stock_repo.save(&record, version).await?;

    Ok(Json(record.items))
}

async fn replenishment(
    State(state): State<AppState>,
    Path(buyer_id): Path<Uuid>,
) -> Result<Json<ReplenishmentAdvice>, AppError> {
    let record = state
        .stock_repo
        .find_by_buyer(buyer_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("stock record not found".to_string()))?;

    Ok(Json(advise(&record.items)))
}
