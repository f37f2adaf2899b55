use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Internal stock withdrawal request status. Pending → InSeparation →
/// {Fulfilled | Cancelled}; cancellation is only reachable before fulfillment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequisitionStatus {
    Pending,
    InSeparation,
    Fulfilled,
    Cancelled,
}

impl RequisitionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequisitionStatus::Pending => "PENDING",
            RequisitionStatus::InSeparation => "IN_SEPARATION",
            RequisitionStatus::Fulfilled => "FULFILLED",
            RequisitionStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for RequisitionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequisitionLine {
    pub name: String,
    pub unit: String,
    pub quantity: i64,
}

/// An internal requisition: sectors withdraw stock for use, distinct from a
/// supplier purchase order. `number` is a per-buyer sequence allocated by the
/// store's atomic counter at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requisition {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub number: i64,
    pub origin_sector: String,
    pub requested_by: String,
    pub priority: Priority,
    #[serde(default)]
    pub notes: String,
    pub lines: Vec<RequisitionLine>,
    pub status: RequisitionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Requisition {
    pub fn is_closed(&self) -> bool {
        matches!(
            self.status,
            RequisitionStatus::Fulfilled | RequisitionStatus::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&RequisitionStatus::InSeparation).unwrap();
        assert_eq!(json, "\"IN_SEPARATION\"");
    }

    #[test]
    fn test_priority_defaults_to_normal() {
        assert_eq!(Priority::default(), Priority::Normal);
    }
}
