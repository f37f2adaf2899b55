use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use provia_shared::normalize_name;

pub const DEFAULT_UNIT: &str = "un";

/// One entry of a buyer's catalog. The catalog is owned by an external
/// collaborator; only `name` and `unit` feed the reconciliation logic, the
/// rest rides along for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub accepts_similar_brand: bool,
    #[serde(default)]
    pub code: Option<String>,
}

impl CatalogItem {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: Some(unit.into()),
            section: None,
            brand: None,
            accepts_similar_brand: false,
            code: None,
        }
    }

    pub fn unit_or_default(&self) -> String {
        match self.unit.as_deref().map(str::trim) {
            Some(u) if !u.is_empty() => u.to_string(),
            _ => DEFAULT_UNIT.to_string(),
        }
    }
}

/// The most recent goods receipt booked against a stock item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastReceipt {
    pub supplier: String,
    pub invoice_ref: String,
    pub quantity: i64,
    pub date: DateTime<Utc>,
}

/// One tracked product line within a buyer's inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockItem {
    pub name: String,
    pub unit: String,
    pub quantity_on_hand: i64,
    pub minimum: i64,
    /// 0 means "no maximum configured".
    pub maximum: i64,
    /// Derived exclusively from order approve/receive bookkeeping; never
    /// accepted from a client payload.
    pub quantity_in_transit: i64,
    pub physical_count: i64,
    pub last_update: Option<DateTime<Utc>>,
    pub last_receipt: Option<LastReceipt>,
}

impl StockItem {
    /// A fresh line with every quantity at zero, as created from the catalog.
    pub fn zeroed(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            quantity_on_hand: 0,
            minimum: 0,
            maximum: 0,
            quantity_in_transit: 0,
            physical_count: 0,
            last_update: None,
            last_receipt: None,
        }
    }
}

/// Per-buyer inventory document. `version` backs the compare-and-swap the
/// store performs on save, so two interleaved read-mutate-write cycles on
/// the same buyer cannot silently drop one of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRecord {
    pub buyer_id: Uuid,
    pub items: Vec<StockItem>,
    pub version: u64,
}

impl StockRecord {
    pub fn new(buyer_id: Uuid) -> Self {
        Self {
            buyer_id,
            items: Vec::new(),
            version: 0,
        }
    }

    /// Bootstrap a record from the catalog with all quantities at zero.
    pub fn from_catalog(buyer_id: Uuid, catalog: &[CatalogItem]) -> Self {
        Self {
            buyer_id,
            items: catalog
                .iter()
                .filter(|c| !c.name.trim().is_empty())
                .map(|c| StockItem::zeroed(c.name.trim(), c.unit_or_default()))
                .collect(),
            version: 0,
        }
    }

    pub fn find_item(&self, name: &str) -> Option<&StockItem> {
        let key = normalize_name(name);
        self.items.iter().find(|i| normalize_name(&i.name) == key)
    }

    pub fn find_item_mut(&mut self, name: &str) -> Option<&mut StockItem> {
        let key = normalize_name(name);
        self.items
            .iter_mut()
            .find(|i| normalize_name(&i.name) == key)
    }
}
