use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use provia_core::repository::StockRepository;
use provia_core::{CoreError, CoreResult};
use provia_stock::{StockItem, StockRecord};

use crate::map_sqlx_err;

/// One row per buyer: items as a JSONB document plus a version column the
/// save path compare-and-swaps against.
pub struct PgStockRepository {
    pool: PgPool,
}

impl PgStockRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn items_to_json(items: &[StockItem]) -> CoreResult<serde_json::Value> {
    serde_json::to_value(items).map_err(|e| CoreError::Storage(e.to_string()))
}

#[async_trait]
impl StockRepository for PgStockRepository {
    async fn find_by_buyer(&self, buyer_id: Uuid) -> CoreResult<Option<StockRecord>> {
        let row = sqlx::query("SELECT buyer_id, items, version FROM stock_records WHERE buyer_id = $1")
            .bind(buyer_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items: serde_json::Value = row.try_get("items").map_err(map_sqlx_err)?;
        let items: Vec<StockItem> =
            serde_json::from_value(items).map_err(|e| CoreError::Storage(e.to_string()))?;
        let version: i64 = row.try_get("version").map_err(map_sqlx_err)?;

        Ok(Some(StockRecord {
            buyer_id,
            items,
            version: version.max(0) as u64,
        }))
    }

    async fn insert(&self, record: &StockRecord) -> CoreResult<()> {
        sqlx::query("INSERT INTO stock_records (buyer_id, items, version) VALUES ($1, $2, 0)")
            .bind(record.buyer_id)
            .bind(items_to_json(&record.items)?)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn save(&self, record: &StockRecord, expected_version: u64) -> CoreResult<u64> {
        let row = sqlx::query(
            "UPDATE stock_records SET items = $3, version = version + 1, updated_at = NOW() \
             WHERE buyer_id = $1 AND version = $2 RETURNING version",
        )
        .bind(record.buyer_id)
        .bind(expected_version as i64)
        .bind(items_to_json(&record.items)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        match row {
            Some(row) => {
                let version: i64 = row.try_get("version").map_err(map_sqlx_err)?;
                Ok(version.max(0) as u64)
            }
            None => Err(CoreError::Conflict(format!(
                "stock record for buyer {} changed underneath version {}",
                record.buyer_id, expected_version
            ))),
        }
    }
}
