use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Purchase order status. Deletion is only permitted while Draft or Sent;
/// there is no stored cancelled state, a cancelled order is removed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Draft,
    Sent,
    Approved,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "DRAFT",
            OrderStatus::Sent => "SENT",
            OrderStatus::Approved => "APPROVED",
            OrderStatus::Completed => "COMPLETED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub quantity: i64,
    pub unit_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub score: i32,
    pub comment: String,
    pub date: DateTime<Utc>,
}

/// A buyer's purchase order against one supplier.
///
/// `buyer` is a free-form reference (account id or company name) exactly as
/// submitted; the buyer directory resolves it to a stock-owning account when
/// stock side effects fire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub buyer: String,
    pub supplier: String,
    pub lines: Vec<OrderLine>,
    pub total: f64,
    pub status: OrderStatus,
    #[serde(default)]
    pub notes: String,
    pub delivery_date: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub received_at: Option<DateTime<Utc>>,
    pub rating: Option<Rating>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Sum of quantity × unit price across lines.
    pub fn computed_total(lines: &[OrderLine]) -> f64 {
        lines
            .iter()
            .map(|l| l.quantity as f64 * l.unit_price)
            .sum()
    }

    pub fn can_delete(&self) -> bool {
        matches!(self.status, OrderStatus::Draft | OrderStatus::Sent)
    }
}
