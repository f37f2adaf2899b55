use chrono::{DateTime, Utc};
use serde::Serialize;

use provia_stock::models::StockRecord;

use crate::models::{Requisition, RequisitionLine, RequisitionStatus};
use crate::RequisitionError;

/// Legal status moves. Closed requisitions accept no further transitions.
pub fn can_transition(from: RequisitionStatus, to: RequisitionStatus) -> bool {
    use RequisitionStatus::*;
    matches!(
        (from, to),
        (Pending, InSeparation)
            | (InSeparation, Fulfilled)
            | (Pending, Cancelled)
            | (InSeparation, Cancelled)
    )
}

/// Apply a guarded transition, stamping the update time.
pub fn transition(
    requisition: &mut Requisition,
    to: RequisitionStatus,
    now: DateTime<Utc>,
) -> Result<(), RequisitionError> {
    if !can_transition(requisition.status, to) {
        return Err(RequisitionError::InvalidTransition {
            from: requisition.status.to_string(),
            to: to.to_string(),
        });
    }
    requisition.status = to;
    requisition.updated_at = now;
    Ok(())
}

/// Fulfillment side effect: each line quantity leaves the buyer's on-hand
/// count, clamped at zero. Lines for unknown products are skipped.
pub fn fulfill(requisition: &Requisition, stock: &mut StockRecord, now: DateTime<Utc>) {
    for line in &requisition.lines {
        if line.quantity <= 0 {
            continue;
        }
        if let Some(item) = stock.find_item_mut(&line.name) {
            item.quantity_on_hand = (item.quantity_on_hand - line.quantity).max(0);
            item.last_update = Some(now);
        }
    }
}

/// Link submissions are accepted only when every requested quantity is
/// covered by the on-hand quantity at submission time.
pub fn validate_link_submission(
    lines: &[RequisitionLine],
    stock: &StockRecord,
) -> Result<(), RequisitionError> {
    if lines.is_empty() {
        return Err(RequisitionError::Validation("no valid lines".into()));
    }
    for line in lines {
        let available = stock
            .find_item(&line.name)
            .map(|i| i.quantity_on_hand)
            .unwrap_or(0);
        if line.quantity > available {
            return Err(RequisitionError::InsufficientStock {
                name: line.name.clone(),
                available,
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailableItem {
    pub name: String,
    pub unit: String,
    pub quantity: i64,
}

/// The stock view offered on the shareable-link page: items with something
/// on hand.
pub fn available_items(stock: &StockRecord) -> Vec<AvailableItem> {
    stock
        .items
        .iter()
        .filter(|i| i.quantity_on_hand > 0)
        .map(|i| AvailableItem {
            name: i.name.clone(),
            unit: i.unit.clone(),
            quantity: i.quantity_on_hand,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use provia_stock::models::StockItem;
    use uuid::Uuid;

    fn requisition(lines: Vec<RequisitionLine>, status: RequisitionStatus) -> Requisition {
        let now = Utc::now();
        Requisition {
            id: Uuid::new_v4(),
            buyer_id: Uuid::new_v4(),
            number: 1,
            origin_sector: "Cozinha".to_string(),
            requested_by: "Chef".to_string(),
            priority: Priority::Normal,
            notes: String::new(),
            lines,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(name: &str, quantity: i64) -> RequisitionLine {
        RequisitionLine {
            name: name.to_string(),
            unit: "kg".to_string(),
            quantity,
        }
    }

    fn stock_with(name: &str, on_hand: i64) -> StockRecord {
        let mut record = StockRecord::new(Uuid::new_v4());
        let mut item = StockItem::zeroed(name, "kg");
        item.quantity_on_hand = on_hand;
        record.items.push(item);
        record
    }

    #[test]
    fn test_transition_table() {
        use RequisitionStatus::*;
        assert!(can_transition(Pending, InSeparation));
        assert!(can_transition(InSeparation, Fulfilled));
        assert!(can_transition(Pending, Cancelled));
        assert!(can_transition(InSeparation, Cancelled));

        assert!(!can_transition(Pending, Fulfilled));
        assert!(!can_transition(Fulfilled, Cancelled));
        assert!(!can_transition(Cancelled, Pending));
        assert!(!can_transition(Fulfilled, Pending));
    }

    #[test]
    fn test_transition_rejects_and_leaves_status() {
        let mut req = requisition(vec![line("Rice", 1)], RequisitionStatus::Pending);
        let err = transition(&mut req, RequisitionStatus::Fulfilled, Utc::now()).unwrap_err();
        assert!(matches!(err, RequisitionError::InvalidTransition { .. }));
        assert_eq!(req.status, RequisitionStatus::Pending);
    }

    #[test]
    fn test_fulfill_decrements_clamped_at_zero() {
        let req = requisition(
            vec![line("Rice", 3), line("Beans", 10)],
            RequisitionStatus::InSeparation,
        );
        let mut stock = stock_with("Rice", 5);
        let mut beans = StockItem::zeroed("Beans", "kg");
        beans.quantity_on_hand = 4;
        stock.items.push(beans);

        fulfill(&req, &mut stock, Utc::now());

        assert_eq!(stock.find_item("Rice").unwrap().quantity_on_hand, 2);
        // Clamped, never negative.
        assert_eq!(stock.find_item("Beans").unwrap().quantity_on_hand, 0);
        assert!(stock.find_item("Rice").unwrap().last_update.is_some());
    }

    #[test]
    fn test_fulfill_skips_unknown_products() {
        let req = requisition(vec![line("Ghost", 3)], RequisitionStatus::InSeparation);
        let mut stock = stock_with("Rice", 5);
        fulfill(&req, &mut stock, Utc::now());
        assert_eq!(stock.find_item("Rice").unwrap().quantity_on_hand, 5);
    }

    #[test]
    fn test_link_submission_bounded_by_availability() {
        let stock = stock_with("Rice", 5);

        assert!(validate_link_submission(&[line("Rice", 5)], &stock).is_ok());

        let err = validate_link_submission(&[line("Rice", 6)], &stock).unwrap_err();
        assert!(matches!(
            err,
            RequisitionError::InsufficientStock { available: 5, .. }
        ));

        let err = validate_link_submission(&[line("Ghost", 1)], &stock).unwrap_err();
        assert!(matches!(
            err,
            RequisitionError::InsufficientStock { available: 0, .. }
        ));
    }

    #[test]
    fn test_available_items_excludes_empty_lines() {
        let mut stock = stock_with("Rice", 5);
        stock.items.push(StockItem::zeroed("Beans", "kg"));

        let available = available_items(&stock);
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].name, "Rice");
        assert_eq!(available[0].quantity, 5);
    }
}
