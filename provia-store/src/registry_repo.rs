use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use provia_core::identity::BuyerRef;
use provia_core::repository::{BuyerDirectory, CatalogStore};
use provia_core::{CoreError, CoreResult};
use provia_stock::CatalogItem;

use crate::map_sqlx_err;

/// Read-only access to the catalog documents maintained by the catalog
/// collaborator. This engine never writes them.
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn get_catalog(&self, buyer_id: Uuid) -> CoreResult<Vec<CatalogItem>> {
        let row = sqlx::query("SELECT items FROM catalogs WHERE buyer_id = $1")
            .bind(buyer_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        match row {
            Some(row) => {
                let items: serde_json::Value = row.try_get("items").map_err(map_sqlx_err)?;
                serde_json::from_value(items).map_err(|e| CoreError::Storage(e.to_string()))
            }
            None => Ok(Vec::new()),
        }
    }
}

/// Buyer accounts as maintained by the identity collaborator; this engine
/// only resolves references against them.
pub struct PgBuyerDirectory {
    pool: PgPool,
}

impl PgBuyerDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BuyerDirectory for PgBuyerDirectory {
    async fn resolve_buyer(&self, reference: &str) -> CoreResult<Option<Uuid>> {
        let Some(buyer_ref) = BuyerRef::parse(reference) else {
            return Ok(None);
        };

        let row = match buyer_ref {
            BuyerRef::Id(id) => sqlx::query("SELECT id FROM buyers WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_err)?,
            BuyerRef::Name(name) => sqlx::query("SELECT id FROM buyers WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_err)?,
        };

        match row {
            Some(row) => Ok(Some(row.try_get("id").map_err(map_sqlx_err)?)),
            None => Ok(None),
        }
    }
}
