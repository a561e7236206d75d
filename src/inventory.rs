//! Derived quantities: pounds on hand and order costs.
//!
//! Nothing here is stored. Every function takes rows the caller already
//! fetched and returns `None` when those rows are not enough to answer, which
//! is different from an answer of zero.

use rust_decimal::Decimal;

use crate::actor_framework::EntityId;
use crate::domain::{AppleVariety, Order, OrderItem, Pounds, Tree};

/// A variety together with its derived stock level.
#[derive(Debug, Clone, PartialEq)]
pub struct VarietyStock {
    pub variety: AppleVariety,
    pub pounds_on_hand: Option<Pounds>,
}

/// Harvested pounds of the variety minus pounds already allocated to orders.
///
/// `trees` and `order_items` may hold rows of other varieties; only rows of
/// `variety_id` are counted. Reports with no recorded weight count as zero.
/// The result can be negative when orders outrun the harvest.
pub fn pounds_on_hand(
    variety_id: EntityId,
    trees: Option<&[Tree]>,
    order_items: Option<&[OrderItem]>,
) -> Option<Pounds> {
    let (trees, order_items) = (trees?, order_items?);

    let harvested: Pounds = trees
        .iter()
        .filter(|tree| tree.variety_id == variety_id)
        .flat_map(|tree| tree.harvest_reports.iter())
        .filter_map(|report| report.pounds_harvested)
        .sum();

    let ordered: Pounds = order_items
        .iter()
        .filter(|item| item.variety_id == variety_id)
        .map(|item| item.pounds)
        .sum();

    Some(harvested - ordered)
}

pub fn item_total(item: &OrderItem, variety: Option<&AppleVariety>) -> Option<Decimal> {
    let variety = variety.filter(|v| v.id == item.variety_id)?;
    Some(item.pounds * variety.cost_per_pound)
}

/// Sum of item totals, or `None` when any item's variety is missing from
/// `varieties`.
pub fn order_total(order: &Order, varieties: &[AppleVariety]) -> Option<Decimal> {
    order.items.iter().try_fold(Decimal::ZERO, |total, item| {
        let variety = varieties.iter().find(|v| v.id == item.variety_id);
        Some(total + item_total(item, variety)?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TreeHarvestReport;
    use chrono::Utc;

    fn lbs(tenths: i64) -> Pounds {
        Decimal::new(tenths, 1)
    }

    fn tree(id: EntityId, variety_id: EntityId, harvests: &[Option<Pounds>]) -> Tree {
        Tree {
            id,
            variety_id,
            date_planted: Utc::now(),
            date_removed: None,
            harvest_reports: harvests
                .iter()
                .enumerate()
                .map(|(n, pounds)| TreeHarvestReport {
                    id: id * 100 + n as EntityId,
                    tree_id: id,
                    employee_id: 2,
                    harvest_date: Some(Utc::now()),
                    pounds_harvested: *pounds,
                })
                .collect(),
        }
    }

    fn item(id: EntityId, variety_id: EntityId, pounds: Pounds) -> OrderItem {
        OrderItem { id, order_id: 1, variety_id, pounds }
    }

    fn gala() -> AppleVariety {
        AppleVariety {
            id: 1,
            name: "Gala".to_string(),
            image_url: None,
            cost_per_pound: Decimal::new(2, 0),
            is_active: true,
        }
    }

    #[test]
    fn test_missing_data_is_not_zero() {
        let trees = vec![tree(1, 1, &[Some(lbs(100))])];
        assert_eq!(pounds_on_hand(1, None, Some(&[][..])), None);
        assert_eq!(pounds_on_hand(1, Some(trees.as_slice()), None), None);
        assert_eq!(pounds_on_hand(1, Some(&[][..]), Some(&[][..])), Some(Decimal::ZERO));
    }

    #[test]
    fn test_harvest_minus_orders_for_one_variety() {
        let trees = vec![
            tree(1, 1, &[Some(lbs(100)), None, Some(lbs(25))]),
            tree(2, 2, &[Some(lbs(900))]),
        ];
        let items = vec![item(1, 1, lbs(30)), item(2, 2, lbs(10))];

        assert_eq!(pounds_on_hand(1, Some(trees.as_slice()), Some(items.as_slice())), Some(lbs(95)));
        assert_eq!(pounds_on_hand(1, Some(trees.as_slice()), Some(&[item(3, 1, lbs(200))][..])), Some(lbs(-75)));
    }

    #[test]
    fn test_order_total_needs_every_variety() {
        let order = Order {
            id: 1,
            customer_id: 9,
            employee_id: None,
            date_ordered: None,
            date_completed: None,
            canceled: false,
            items: vec![item(1, 1, lbs(15)), item(2, 1, lbs(10))],
        };
        assert_eq!(order_total(&order, &[gala()]), Some(Decimal::new(5, 0)));

        let mut mixed = order.clone();
        mixed.items.push(item(3, 7, lbs(10)));
        assert_eq!(order_total(&mixed, &[gala()]), None);
        assert_eq!(item_total(&mixed.items[2], Some(&gala())), None);
    }
}
