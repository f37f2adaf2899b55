use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use provia_core::repository::RequisitionRepository;
use provia_core::{CoreError, CoreResult};
use provia_requisition::Requisition;

use crate::map_sqlx_err;

pub struct PgRequisitionRepository {
    pool: PgPool,
}

impl PgRequisitionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_doc(requisition: &Requisition) -> CoreResult<serde_json::Value> {
    serde_json::to_value(requisition).map_err(|e| CoreError::Storage(e.to_string()))
}

fn from_doc(doc: serde_json::Value) -> CoreResult<Requisition> {
    serde_json::from_value(doc).map_err(|e| CoreError::Storage(e.to_string()))
}

#[async_trait]
impl RequisitionRepository for PgRequisitionRepository {
    async fn insert(&self, requisition: &Requisition) -> CoreResult<()> {
        sqlx::query(
            "INSERT INTO requisitions (id, buyer_id, origin_sector, created_at, doc) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(requisition.id)
        .bind(requisition.buyer_id)
        .bind(&requisition.origin_sector)
        .bind(requisition.created_at)
        .bind(to_doc(requisition)?)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Requisition>> {
        let row = sqlx::query("SELECT doc FROM requisitions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        match row {
            Some(row) => {
                let doc: serde_json::Value = row.try_get("doc").map_err(map_sqlx_err)?;
                Ok(Some(from_doc(doc)?))
            }
            None => Ok(None),
        }
    }

    async fn list(&self, buyer_id: Uuid, sector: Option<&str>) -> CoreResult<Vec<Requisition>> {
        let rows = sqlx::query(
            "SELECT doc FROM requisitions \
             WHERE buyer_id = $1 AND ($2::text IS NULL OR origin_sector = $2) \
             ORDER BY created_at DESC",
        )
        .bind(buyer_id)
        .bind(sector)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        let mut requisitions = Vec::with_capacity(rows.len());
        for row in rows {
            let doc: serde_json::Value = row.try_get("doc").map_err(map_sqlx_err)?;
            requisitions.push(from_doc(doc)?);
        }
        Ok(requisitions)
    }

    async fn update(&self, requisition: &Requisition) -> CoreResult<()> {
        let result = sqlx::query(
            "UPDATE requisitions SET origin_sector = $2, doc = $3 WHERE id = $1",
        )
        .bind(requisition.id)
        .bind(&requisition.origin_sector)
        .bind(to_doc(requisition)?)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "requisition {}",
                requisition.id
            )));
        }
        Ok(())
    }

    /// Atomic per-buyer sequence: a counter row is upserted and incremented
    /// in one statement, so concurrent creations never share a number.
    async fn next_number(&self, buyer_id: Uuid) -> CoreResult<i64> {
        let row = sqlx::query(
            "INSERT INTO requisition_counters (buyer_id, last_number) VALUES ($1, 1) \
             ON CONFLICT (buyer_id) \
             DO UPDATE SET last_number = requisition_counters.last_number + 1 \
             RETURNING last_number",
        )
        .bind(buyer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        row.try_get("last_number").map_err(map_sqlx_err)
    }
}
