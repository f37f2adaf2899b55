use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use provia_shared::normalize_name;

use crate::models::{LastReceipt, StockItem, StockRecord, DEFAULT_UNIT};
use crate::StockError;

/// What to do when a receipt names a product the record does not carry.
///
/// The strict receipt endpoint rejects unknown products; the free-form
/// whole-stock save creates them on the fly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptPolicy {
    Strict,
    CreateMissing,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Receipt {
    pub product: String,
    #[serde(default)]
    pub unit: Option<String>,
    pub quantity: i64,
    #[serde(default)]
    pub supplier: String,
    #[serde(default)]
    pub invoice_ref: String,
}

/// Book a goods receipt: add to on-hand, stamp the update time and overwrite
/// the last-receipt block.
pub fn register_receipt(
    record: &mut StockRecord,
    receipt: &Receipt,
    policy: ReceiptPolicy,
    now: DateTime<Utc>,
) -> Result<(), StockError> {
    let product = receipt.product.trim();
    if product.is_empty() {
        return Err(StockError::Validation("product name is required".into()));
    }
    if receipt.quantity <= 0 {
        return Err(StockError::Validation(
            "receipt quantity must be positive".into(),
        ));
    }

    let key = normalize_name(product);
    let index = match record
        .items
        .iter()
        .position(|i| normalize_name(&i.name) == key)
    {
        Some(index) => index,
        None => match policy {
            ReceiptPolicy::Strict => {
                return Err(StockError::ItemNotFound(product.to_string()));
            }
            ReceiptPolicy::CreateMissing => {
                let unit = receipt
                    .unit
                    .as_deref()
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .unwrap_or(DEFAULT_UNIT);
                record.items.push(StockItem::zeroed(product, unit));
                record.items.len() - 1
            }
        },
    };

    let item = &mut record.items[index];
    item.quantity_on_hand += receipt.quantity;
    item.last_update = Some(now);
    item.last_receipt = Some(LastReceipt {
        supplier: receipt.supplier.trim().to_string(),
        invoice_ref: receipt.invoice_ref.trim().to_string(),
        quantity: receipt.quantity,
        date: now,
    });
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountEntry {
    pub name: String,
    pub physical_count: i64,
}

/// Record a physical count for each named item that exists. Unmatched names
/// are skipped without error.
pub fn submit_physical_count(record: &mut StockRecord, counts: &[CountEntry], now: DateTime<Utc>) {
    for entry in counts {
        if let Some(item) = record.find_item_mut(&entry.name) {
            item.physical_count = entry.physical_count.max(0);
            item.last_update = Some(now);
        }
    }
}

/// Client-supplied shape of one stock line in a whole-snapshot save. Note the
/// absence of an in-transit field: that quantity is never taken from the
/// payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotItem {
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub quantity_on_hand: i64,
    #[serde(default)]
    pub minimum: i64,
    #[serde(default)]
    pub maximum: i64,
    #[serde(default)]
    pub physical_count: i64,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_receipt: Option<LastReceipt>,
}

/// Replace the whole item list. In-transit quantities are carried over from
/// the prior stored record per normalized name (0 for new names), keeping
/// that field derived solely from order bookkeeping. Payload entries that
/// collide under the normalized key keep the first occurrence only, so the
/// stored record never holds two items with the same match key.
pub fn save_full_snapshot(prior: Option<&StockRecord>, items: &[SnapshotItem]) -> Vec<StockItem> {
    let mut in_transit: HashMap<String, i64> = HashMap::new();
    if let Some(record) = prior {
        for item in &record.items {
            let key = normalize_name(&item.name);
            if !key.is_empty() {
                in_transit.insert(key, item.quantity_in_transit.max(0));
            }
        }
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<StockItem> = Vec::with_capacity(items.len());
    for i in items {
        if i.name.trim().is_empty() {
            continue;
        }
        let key = normalize_name(&i.name);
        if !seen.insert(key.clone()) {
            continue;
        }
        let unit = i
            .unit
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_UNIT);
        out.push(StockItem {
            name: i.name.trim().to_string(),
            unit: unit.to_string(),
            quantity_on_hand: i.quantity_on_hand.max(0),
            minimum: i.minimum.max(0),
            maximum: i.maximum.max(0),
            quantity_in_transit: in_transit.get(&key).copied().unwrap_or(0),
            physical_count: i.physical_count.max(0),
            last_update: i.last_update,
            last_receipt: i.last_receipt.clone(),
        });
    }
    out
}

/// Replace-or-append a single item by name, used by the item-level PUT.
pub fn upsert_item(record: &mut StockRecord, item: StockItem) {
    match record.find_item_mut(&item.name) {
        Some(existing) => *existing = item,
        None => record.items.push(item),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn record_with(items: Vec<StockItem>) -> StockRecord {
        let mut record = StockRecord::new(Uuid::new_v4());
        record.items = items;
        record
    }

    fn receipt(product: &str, quantity: i64) -> Receipt {
        Receipt {
            product: product.to_string(),
            unit: None,
            quantity,
            supplier: "Atacadão Sul".to_string(),
            invoice_ref: "NF-1234".to_string(),
        }
    }

    #[test]
    fn test_strict_receipt_adds_to_on_hand() {
        let mut record = record_with(vec![StockItem::zeroed("Rice", "kg")]);
        let now = Utc::now();

        register_receipt(&mut record, &receipt("rice", 10), ReceiptPolicy::Strict, now).unwrap();

        let item = record.find_item("Rice").unwrap();
        assert_eq!(item.quantity_on_hand, 10);
        assert_eq!(item.last_update, Some(now));
        let last = item.last_receipt.as_ref().unwrap();
        assert_eq!(last.supplier, "Atacadão Sul");
        assert_eq!(last.invoice_ref, "NF-1234");
        assert_eq!(last.quantity, 10);
    }

    #[test]
    fn test_strict_receipt_rejects_unknown_product() {
        let mut record = record_with(vec![]);
        let err = register_receipt(
            &mut record,
            &receipt("Rice", 5),
            ReceiptPolicy::Strict,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, StockError::ItemNotFound(_)));
        assert!(record.items.is_empty());
    }

    #[test]
    fn test_create_missing_receipt_appends_item() {
        let mut record = record_with(vec![]);
        let mut entry = receipt("Rice", 5);
        entry.unit = Some("kg".to_string());

        register_receipt(&mut record, &entry, ReceiptPolicy::CreateMissing, Utc::now()).unwrap();

        let item = record.find_item("Rice").unwrap();
        assert_eq!(item.unit, "kg");
        assert_eq!(item.quantity_on_hand, 5);
        assert_eq!(item.quantity_in_transit, 0);
    }

    #[test]
    fn test_receipt_quantity_must_be_positive() {
        let mut record = record_with(vec![StockItem::zeroed("Rice", "kg")]);
        for qty in [0, -3] {
            let err = register_receipt(
                &mut record,
                &receipt("Rice", qty),
                ReceiptPolicy::Strict,
                Utc::now(),
            )
            .unwrap_err();
            assert!(matches!(err, StockError::Validation(_)));
        }
        assert_eq!(record.find_item("Rice").unwrap().quantity_on_hand, 0);
    }

    #[test]
    fn test_receipt_overwrites_last_receipt() {
        let mut record = record_with(vec![StockItem::zeroed("Rice", "kg")]);
        register_receipt(&mut record, &receipt("Rice", 5), ReceiptPolicy::Strict, Utc::now())
            .unwrap();
        let mut second = receipt("Rice", 3);
        second.invoice_ref = "NF-9999".to_string();
        register_receipt(&mut record, &second, ReceiptPolicy::Strict, Utc::now()).unwrap();

        let item = record.find_item("Rice").unwrap();
        assert_eq!(item.quantity_on_hand, 8);
        assert_eq!(item.last_receipt.as_ref().unwrap().invoice_ref, "NF-9999");
    }

    #[test]
    fn test_physical_count_skips_unmatched_names() {
        let mut record = record_with(vec![StockItem::zeroed("Rice", "kg")]);
        let now = Utc::now();
        submit_physical_count(
            &mut record,
            &[
                CountEntry {
                    name: "rice".to_string(),
                    physical_count: 42,
                },
                CountEntry {
                    name: "ghost".to_string(),
                    physical_count: 7,
                },
            ],
            now,
        );

        assert_eq!(record.items.len(), 1);
        let item = record.find_item("Rice").unwrap();
        assert_eq!(item.physical_count, 42);
        assert_eq!(item.last_update, Some(now));
    }

    #[test]
    fn test_snapshot_never_takes_in_transit_from_payload() {
        let mut prior_item = StockItem::zeroed("Rice", "kg");
        prior_item.quantity_in_transit = 9;
        let prior = record_with(vec![prior_item]);

        let items = save_full_snapshot(
            Some(&prior),
            &[
                SnapshotItem {
                    name: "RICE".to_string(),
                    unit: Some("kg".to_string()),
                    quantity_on_hand: 4,
                    minimum: 2,
                    maximum: 0,
                    physical_count: 4,
                    last_update: None,
                    last_receipt: None,
                },
                SnapshotItem {
                    name: "Beans".to_string(),
                    unit: None,
                    quantity_on_hand: 1,
                    minimum: 0,
                    maximum: 0,
                    physical_count: 0,
                    last_update: None,
                    last_receipt: None,
                },
            ],
        );

        // Matched name keeps the server-side in-transit, new name gets 0.
        assert_eq!(items[0].quantity_in_transit, 9);
        assert_eq!(items[0].quantity_on_hand, 4);
        assert_eq!(items[1].quantity_in_transit, 0);
        assert_eq!(items[1].unit, DEFAULT_UNIT);
    }

    #[test]
    fn test_snapshot_collapses_names_that_collide_under_the_key() {
        let mut prior_item = StockItem::zeroed("Rice", "kg");
        prior_item.quantity_in_transit = 9;
        let prior = record_with(vec![prior_item]);

        let snapshot = |name: &str, on_hand: i64| SnapshotItem {
            name: name.to_string(),
            unit: None,
            quantity_on_hand: on_hand,
            minimum: 0,
            maximum: 0,
            physical_count: 0,
            last_update: None,
            last_receipt: None,
        };
        let items = save_full_snapshot(
            Some(&prior),
            &[snapshot("Rice", 4), snapshot("RICE", 7), snapshot("ricé", 1)],
        );

        // One stored item per match key, first occurrence wins, and the
        // carried in-transit is not multiplied across duplicates.
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Rice");
        assert_eq!(items[0].quantity_on_hand, 4);
        assert_eq!(items[0].quantity_in_transit, 9);
    }

    #[test]
    fn test_snapshot_clamps_negative_quantities() {
        let items = save_full_snapshot(
            None,
            &[SnapshotItem {
                name: "Rice".to_string(),
                unit: None,
                quantity_on_hand: -5,
                minimum: -1,
                maximum: -2,
                physical_count: -3,
                last_update: None,
                last_receipt: None,
            }],
        );
        assert_eq!(items[0].quantity_on_hand, 0);
        assert_eq!(items[0].minimum, 0);
        assert_eq!(items[0].maximum, 0);
        assert_eq!(items[0].physical_count, 0);
    }

    #[test]
    fn test_upsert_item_replaces_by_name() {
        let mut record = record_with(vec![StockItem::zeroed("Rice", "kg")]);
        let mut replacement = StockItem::zeroed("rice", "saco");
        replacement.quantity_on_hand = 3;
        upsert_item(&mut record, replacement);

        assert_eq!(record.items.len(), 1);
        assert_eq!(record.items[0].quantity_on_hand, 3);

        upsert_item(&mut record, StockItem::zeroed("Beans", "kg"));
        assert_eq!(record.items.len(), 2);
    }
}
