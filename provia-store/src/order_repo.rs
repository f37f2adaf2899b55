use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use provia_core::repository::OrderRepository;
use provia_core::{CoreError, CoreResult};
use provia_order::Order;

use crate::map_sqlx_err;

/// Orders live as whole JSONB documents with a few extracted columns for
/// filtering, mirroring the document shape the engine mutates in memory.
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_doc(order: &Order) -> CoreResult<serde_json::Value> {
    serde_json::to_value(order).map_err(|e| CoreError::Storage(e.to_string()))
}

fn from_doc(doc: serde_json::Value) -> CoreResult<Order> {
    serde_json::from_value(doc).map_err(|e| CoreError::Storage(e.to_string()))
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn insert(&self, order: &Order) -> CoreResult<()> {
        sqlx::query(
            "INSERT INTO orders (id, buyer, supplier, status, created_at, doc) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(order.id)
        .bind(&order.buyer)
        .bind(&order.supplier)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(to_doc(order)?)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> CoreResult<Option<Order>> {
        let row = sqlx::query("SELECT doc FROM orders WHERE id = $1")
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

    async fn list(&self, buyer: Option<&str>, supplier: Option<&str>) -> CoreResult<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT doc FROM orders \
             WHERE ($1::text IS NULL OR buyer = $1) \
               AND ($2::text IS NULL OR supplier = $2) \
             ORDER BY created_at DESC",
        )
        .bind(buyer)
        .bind(supplier)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let doc: serde_json::Value = row.try_get("doc").map_err(map_sqlx_err)?;
            orders.push(from_doc(doc)?);
        }
        Ok(orders)
    }

    async fn update(&self, order: &Order) -> CoreResult<()> {
        let result = sqlx::query(
            "UPDATE orders SET buyer = $2, supplier = $3, status = $4, doc = $5 WHERE id = $1",
        )
        .bind(order.id)
        .bind(&order.buyer)
        .bind(&order.supplier)
        .bind(order.status.as_str())
        .bind(to_doc(order)?)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("order {}", order.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("order {}", id)));
        }
        Ok(())
    }
}
