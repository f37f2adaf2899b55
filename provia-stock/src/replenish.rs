use serde::{Deserialize, Serialize};

use crate::models::StockItem;

/// An item is below threshold when its projected quantity (on hand plus
/// in transit) does not exceed the configured minimum.
pub fn below_minimum(item: &StockItem) -> bool {
    item.quantity_on_hand + item.quantity_in_transit <= item.minimum
}

/// Suggested reorder quantity. With a maximum configured, refill up to it;
/// otherwise target twice the minimum. Never negative.
pub fn suggested_quantity(item: &StockItem) -> i64 {
    let projected = item.quantity_on_hand + item.quantity_in_transit;
    let target = if item.maximum > 0 {
        item.maximum
    } else {
        2 * item.minimum
    };
    (target - projected).max(0)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    pub unit: String,
    pub quantity_on_hand: i64,
    pub quantity_in_transit: i64,
    pub minimum: i64,
    pub suggested: i64,
}

/// Advisor output: `actionable` carries a positive suggested quantity;
/// `no_suggestion` lists below-threshold items the formula yields 0 for,
/// surfaced as "out of stock, nothing computed".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplenishmentAdvice {
    pub actionable: Vec<Suggestion>,
    pub no_suggestion: Vec<String>,
}

pub fn advise(items: &[StockItem]) -> ReplenishmentAdvice {
    let mut advice = ReplenishmentAdvice::default();
    for item in items {
        if !below_minimum(item) {
            continue;
        }
        let suggested = suggested_quantity(item);
        if suggested > 0 {
            advice.actionable.push(Suggestion {
                name: item.name.clone(),
                unit: item.unit.clone(),
                quantity_on_hand: item.quantity_on_hand,
                quantity_in_transit: item.quantity_in_transit,
                minimum: item.minimum,
                suggested,
            });
        } else {
            advice.no_suggestion.push(item.name.clone());
        }
    }
    advice
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(on_hand: i64, in_transit: i64, minimum: i64, maximum: i64) -> StockItem {
        let mut item = StockItem::zeroed("Rice", "kg");
        item.quantity_on_hand = on_hand;
        item.quantity_in_transit = in_transit;
        item.minimum = minimum;
        item.maximum = maximum;
        item
    }

    #[test]
    fn test_below_minimum_is_non_strict() {
        assert!(below_minimum(&item(5, 5, 10, 0)));
        assert!(!below_minimum(&item(6, 5, 10, 0)));
        assert!(below_minimum(&item(0, 0, 0, 0)));
    }

    #[test]
    fn test_suggestion_without_maximum_targets_twice_the_minimum() {
        assert_eq!(suggested_quantity(&item(3, 0, 10, 0)), 17);
    }

    #[test]
    fn test_suggestion_with_maximum_refills_to_maximum() {
        assert_eq!(suggested_quantity(&item(3, 0, 10, 20)), 17);
        assert_eq!(suggested_quantity(&item(3, 4, 10, 20)), 13);
    }

    #[test]
    fn test_suggestion_never_negative() {
        assert_eq!(suggested_quantity(&item(30, 0, 10, 20)), 0);
    }

    #[test]
    fn test_advise_splits_actionable_and_no_suggestion() {
        let mut empty = item(0, 0, 0, 0);
        empty.name = "Sal".to_string();
        let items = vec![item(3, 0, 10, 0), empty, item(50, 0, 10, 20)];

        let advice = advise(&items);
        assert_eq!(advice.actionable.len(), 1);
        assert_eq!(advice.actionable[0].suggested, 17);
        assert_eq!(advice.no_suggestion, vec!["Sal".to_string()]);
    }
}
