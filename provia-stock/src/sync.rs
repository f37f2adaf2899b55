use std::collections::HashMap;

use provia_shared::normalize_name;

use crate::models::{CatalogItem, StockItem};

/// Result of reconciling a stock item list against the catalog. Callers must
/// skip persistence when `changed` is false.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub items: Vec<StockItem>,
    pub changed: bool,
}

/// Reconcile a buyer's stock items against the catalog.
///
/// The catalog is authoritative for descriptive fields: matched items have
/// their name/unit refreshed, catalog-only items are appended with all
/// quantities at zero, and stock-only items are dropped. Quantity fields of
/// surviving items are never touched. Idempotent: re-applying with the same
/// catalog reports `changed == false`.
pub fn synchronize(catalog: &[CatalogItem], current: &[StockItem]) -> SyncOutcome {
    let mut reference: HashMap<String, (String, String)> = HashMap::new();
    for entry in catalog {
        let key = normalize_name(&entry.name);
        if key.is_empty() {
            continue;
        }
        reference.insert(key, (entry.name.trim().to_string(), entry.unit_or_default()));
    }

    let mut changed = false;

    // Drop lines that left the catalog.
    let mut items: Vec<StockItem> = current
        .iter()
        .filter(|i| reference.contains_key(&normalize_name(&i.name)))
        .cloned()
        .collect();
    if items.len() != current.len() {
        changed = true;
    }

    // Refresh survivors and append newcomers, in catalog order.
    for entry in catalog {
        let key = normalize_name(&entry.name);
        let Some((name, unit)) = reference.get(&key) else {
            continue;
        };
        match items.iter_mut().find(|i| normalize_name(&i.name) == key) {
            Some(existing) => {
                if existing.name != *name || existing.unit != *unit {
                    existing.name = name.clone();
                    existing.unit = unit.clone();
                    changed = true;
                }
            }
            None => {
                items.push(StockItem::zeroed(name.clone(), unit.clone()));
                changed = true;
            }
        }
    }

    SyncOutcome { items, changed }
}

/// Append-only merge: catalog items missing from stock are added at zero,
/// nothing is removed or refreshed. Returns how many lines were added.
pub fn merge_missing(catalog: &[CatalogItem], items: &mut Vec<StockItem>) -> usize {
    let mut existing: std::collections::HashSet<String> =
        items.iter().map(|i| normalize_name(&i.name)).collect();
    let mut added = 0;
    for entry in catalog {
        let key = normalize_name(&entry.name);
        if key.is_empty() || !existing.insert(key) {
            continue;
        }
        items.push(StockItem::zeroed(entry.name.trim(), entry.unit_or_default()));
        added += 1;
    }
    added
}
