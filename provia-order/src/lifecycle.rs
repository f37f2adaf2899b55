use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use provia_stock::models::{StockItem, StockRecord, DEFAULT_UNIT};
use provia_stock::LastReceipt;

use crate::models::{Order, OrderLine, OrderStatus, Rating};
use crate::OrderError;

#[derive(Debug, Clone, Deserialize)]
pub struct LineInput {
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub unit_price: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
    pub buyer: String,
    pub supplier: String,
    pub lines: Vec<LineInput>,
    /// When supplied, the explicit value wins over the computed sum.
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub delivery_date: Option<DateTime<Utc>>,
}

/// Build a new order from a buyer submission. Supplier and at least one line
/// are mandatory; the total defaults to the computed sum.
pub fn create_order(cmd: CreateOrder, now: DateTime<Utc>) -> Result<Order, OrderError> {
    let supplier = cmd.supplier.trim().to_string();
    if supplier.is_empty() {
        return Err(OrderError::Validation("supplier is required".into()));
    }
    if cmd.lines.is_empty() {
        return Err(OrderError::Validation("order lines are required".into()));
    }

    let lines: Vec<OrderLine> = cmd
        .lines
        .iter()
        .map(|l| OrderLine {
            id: Uuid::new_v4(),
            name: l.name.trim().to_string(),
            unit: l
                .unit
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .unwrap_or(DEFAULT_UNIT)
                .to_string(),
            quantity: l.quantity.max(0),
            unit_price: if l.unit_price.is_finite() && l.unit_price > 0.0 {
                l.unit_price
            } else {
                0.0
            },
        })
        .collect();

    let total = match cmd.total {
        Some(explicit) if explicit.is_finite() && explicit > 0.0 => explicit,
        _ => Order::computed_total(&lines),
    };
    let status = cmd.status.unwrap_or(OrderStatus::Sent);

    Ok(Order {
        id: Uuid::new_v4(),
        buyer: cmd.buyer.trim().to_string(),
        supplier,
        lines,
        total,
        status,
        notes: cmd.notes.unwrap_or_default().trim().to_string(),
        delivery_date: cmd.delivery_date,
        sent_at: matches!(status, OrderStatus::Sent).then_some(now),
        approved_at: None,
        received_at: None,
        rating: None,
        created_at: now,
        updated_at: now,
    })
}

/// Whether moving from `previous` to `next` crosses into Approved. Both the
/// dedicated approve action and the generic patch path consult this guard so
/// the stock side effect fires exactly once per transition.
pub fn approve_fires(previous: OrderStatus, next: OrderStatus) -> bool {
    next == OrderStatus::Approved && previous != OrderStatus::Approved
}

/// Stock side effect of approval: every line quantity joins the buyer's
/// in-transit count, creating zero-on-hand items for unknown products.
/// Lines with a blank name or non-positive quantity are ignored.
pub fn apply_approve(order: &mut Order, stock: &mut StockRecord, now: DateTime<Utc>) {
    for line in &order.lines {
        let name = line.name.trim();
        if name.is_empty() || line.quantity <= 0 {
            continue;
        }
        match stock.find_item_mut(name) {
            Some(item) => item.quantity_in_transit += line.quantity,
            None => {
                let mut item = StockItem::zeroed(name, line.unit.trim());
                item.quantity_in_transit = line.quantity;
                stock.items.push(item);
            }
        }
    }
    order.status = OrderStatus::Approved;
    order.approved_at = Some(now);
    order.updated_at = now;
}

/// Stock side effect of receipt: in-transit drops (clamped at zero), on-hand
/// grows, and the last-receipt block records the supplier delivery. Only an
/// Approved order may be received; any other prior status is rejected before
/// any stock mutation.
pub fn apply_receive(
    order: &mut Order,
    stock: &mut StockRecord,
    now: DateTime<Utc>,
) -> Result<(), OrderError> {
    if order.status != OrderStatus::Approved {
        return Err(OrderError::InvalidTransition {
            from: order.status.to_string(),
            to: OrderStatus::Completed.to_string(),
        });
    }

    for line in &order.lines {
        let name = line.name.trim();
        if name.is_empty() || line.quantity <= 0 {
            continue;
        }
        if let Some(item) = stock.find_item_mut(name) {
            item.quantity_in_transit = (item.quantity_in_transit - line.quantity).max(0);
            item.quantity_on_hand += line.quantity;
            item.last_update = Some(now);
            item.last_receipt = Some(LastReceipt {
                supplier: order.supplier.clone(),
                invoice_ref: String::new(),
                quantity: line.quantity,
                date: now,
            });
        }
    }

    order.status = OrderStatus::Completed;
    order.received_at = Some(now);
    order.updated_at = now;
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
pub enum RemoveLineOutcome {
    /// The order survives with the remaining lines and a recomputed total.
    Updated,
    /// The last line was removed; the order should be deleted.
    Empty,
}

/// Remove one line and recompute the total from what remains.
pub fn remove_line(order: &mut Order, line_id: Uuid, now: DateTime<Utc>) -> RemoveLineOutcome {
    order.lines.retain(|l| l.id != line_id);
    if order.lines.is_empty() {
        return RemoveLineOutcome::Empty;
    }
    order.total = Order::computed_total(&order.lines);
    order.updated_at = now;
    RemoveLineOutcome::Updated
}

/// Attach a rating. No status transition, no stock effect.
pub fn rate(order: &mut Order, score: i32, comment: &str, now: DateTime<Utc>) {
    order.rating = Some(Rating {
        score: score.max(0),
        comment: comment.trim().to_string(),
        date: now,
    });
    order.updated_at = now;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cmd() -> CreateOrder {
        CreateOrder {
            buyer: "Restaurante Vista".to_string(),
            supplier: "Atacadão Sul".to_string(),
            lines: vec![
                LineInput {
                    name: "Rice".to_string(),
                    unit: Some("kg".to_string()),
                    quantity: 5,
                    unit_price: 2.0,
                },
                LineInput {
                    name: "Beans".to_string(),
                    unit: None,
                    quantity: 3,
                    unit_price: 4.0,
                },
            ],
            total: None,
            status: None,
            notes: None,
            delivery_date: None,
        }
    }

    fn approved_order() -> Order {
        let mut order = create_order(base_cmd(), Utc::now()).unwrap();
        order.status = OrderStatus::Approved;
        order
    }

    #[test]
    fn test_create_computes_total() {
        let order = create_order(base_cmd(), Utc::now()).unwrap();
        assert_eq!(order.total, 22.0);
        assert_eq!(order.status, OrderStatus::Sent);
        assert_eq!(order.lines[1].unit, DEFAULT_UNIT);
    }

    #[test]
    fn test_create_explicit_total_wins() {
        let mut cmd = base_cmd();
        cmd.total = Some(30.0);
        let order = create_order(cmd, Utc::now()).unwrap();
        assert_eq!(order.total, 30.0);
    }

    #[test]
    fn test_create_requires_supplier_and_lines() {
        let mut cmd = base_cmd();
        cmd.supplier = "  ".to_string();
        assert!(matches!(
            create_order(cmd, Utc::now()),
            Err(OrderError::Validation(_))
        ));

        let mut cmd = base_cmd();
        cmd.lines.clear();
        assert!(matches!(
            create_order(cmd, Utc::now()),
            Err(OrderError::Validation(_))
        ));
    }

    #[test]
    fn test_approve_guard_fires_once() {
        assert!(approve_fires(OrderStatus::Sent, OrderStatus::Approved));
        assert!(approve_fires(OrderStatus::Draft, OrderStatus::Approved));
        assert!(!approve_fires(OrderStatus::Approved, OrderStatus::Approved));
        assert!(!approve_fires(OrderStatus::Sent, OrderStatus::Sent));
    }

    #[test]
    fn test_approve_creates_missing_stock_item() {
        let mut order = create_order(base_cmd(), Utc::now()).unwrap();
        let mut stock = StockRecord::new(Uuid::new_v4());

        apply_approve(&mut order, &mut stock, Utc::now());

        assert_eq!(order.status, OrderStatus::Approved);
        let rice = stock.find_item("Rice").unwrap();
        assert_eq!(rice.quantity_in_transit, 5);
        assert_eq!(rice.quantity_on_hand, 0);
        let beans = stock.find_item("Beans").unwrap();
        assert_eq!(beans.quantity_in_transit, 3);
    }

    #[test]
    fn test_approve_increments_existing_in_transit() {
        let mut order = create_order(base_cmd(), Utc::now()).unwrap();
        let mut stock = StockRecord::new(Uuid::new_v4());
        let mut existing = StockItem::zeroed("rice", "kg");
        existing.quantity_in_transit = 2;
        stock.items.push(existing);

        apply_approve(&mut order, &mut stock, Utc::now());
        assert_eq!(stock.find_item("Rice").unwrap().quantity_in_transit, 7);
    }

    #[test]
    fn test_receive_reverses_transit() {
        let mut order = create_order(base_cmd(), Utc::now()).unwrap();
        let mut stock = StockRecord::new(Uuid::new_v4());
        apply_approve(&mut order, &mut stock, Utc::now());

        apply_receive(&mut order, &mut stock, Utc::now()).unwrap();

        assert_eq!(order.status, OrderStatus::Completed);
        assert!(order.received_at.is_some());
        let rice = stock.find_item("Rice").unwrap();
        assert_eq!(rice.quantity_in_transit, 0);
        assert_eq!(rice.quantity_on_hand, 5);
        assert_eq!(rice.last_receipt.as_ref().unwrap().supplier, "Atacadão Sul");
    }

    #[test]
    fn test_approve_then_receive_conserves_in_transit() {
        let mut order = create_order(base_cmd(), Utc::now()).unwrap();
        let mut stock = StockRecord::new(Uuid::new_v4());
        let mut existing = StockItem::zeroed("Rice", "kg");
        existing.quantity_in_transit = 4;
        stock.items.push(existing);

        apply_approve(&mut order, &mut stock, Utc::now());
        apply_receive(&mut order, &mut stock, Utc::now()).unwrap();

        // In-transit returns exactly to its pre-approval value.
        assert_eq!(stock.find_item("Rice").unwrap().quantity_in_transit, 4);
    }

    #[test]
    fn test_receive_rejected_unless_approved() {
        for status in [OrderStatus::Draft, OrderStatus::Sent, OrderStatus::Completed] {
            let mut order = create_order(base_cmd(), Utc::now()).unwrap();
            order.status = status;
            let mut stock = StockRecord::new(Uuid::new_v4());
            stock.items.push(StockItem::zeroed("Rice", "kg"));

            let err = apply_receive(&mut order, &mut stock, Utc::now()).unwrap_err();
            assert!(matches!(err, OrderError::InvalidTransition { .. }));
            // No stock mutation, status unchanged.
            assert_eq!(order.status, status);
            assert_eq!(stock.find_item("Rice").unwrap().quantity_on_hand, 0);
        }
    }

    #[test]
    fn test_receive_skips_lines_missing_from_stock() {
        let mut order = approved_order();
        let mut stock = StockRecord::new(Uuid::new_v4());
        stock.items.push(StockItem::zeroed("Rice", "kg"));

        apply_receive(&mut order, &mut stock, Utc::now()).unwrap();
        assert_eq!(stock.find_item("Rice").unwrap().quantity_on_hand, 5);
        assert!(stock.find_item("Beans").is_none());
    }

    #[test]
    fn test_transit_clamped_at_zero_on_receive() {
        let mut order = approved_order();
        let mut stock = StockRecord::new(Uuid::new_v4());
        let mut item = StockItem::zeroed("Rice", "kg");
        item.quantity_in_transit = 2; // less than the line quantity of 5
        stock.items.push(item);

        apply_receive(&mut order, &mut stock, Utc::now()).unwrap();
        let rice = stock.find_item("Rice").unwrap();
        assert_eq!(rice.quantity_in_transit, 0);
        assert_eq!(rice.quantity_on_hand, 5);
    }

    #[test]
    fn test_remove_line_recomputes_total() {
        let mut cmd = base_cmd();
        cmd.total = Some(100.0);
        let mut order = create_order(cmd, Utc::now()).unwrap();
        let removed = order.lines[0].id;

        let outcome = remove_line(&mut order, removed, Utc::now());
        assert_eq!(outcome, RemoveLineOutcome::Updated);
        // Explicit total is replaced by the recomputed remainder.
        assert_eq!(order.total, 12.0);

        let last = order.lines[0].id;
        assert_eq!(remove_line(&mut order, last, Utc::now()), RemoveLineOutcome::Empty);
    }

    #[test]
    fn test_rate_leaves_status_alone() {
        let mut order = approved_order();
        rate(&mut order, 4, "  on time  ", Utc::now());
        assert_eq!(order.status, OrderStatus::Approved);
        let rating = order.rating.as_ref().unwrap();
        assert_eq!(rating.score, 4);
        assert_eq!(rating.comment, "on time");
    }

    #[test]
    fn test_delete_guard() {
        let mut order = create_order(base_cmd(), Utc::now()).unwrap();
        assert!(order.can_delete());
        order.status = OrderStatus::Approved;
        assert!(!order.can_delete());
        order.status = OrderStatus::Completed;
        assert!(!order.can_delete());
    }
}
