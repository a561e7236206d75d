use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::actor_framework::EntityId;
use crate::domain::Pounds;

/// Represents a customer order and the items it owns.
///
/// The lifecycle is derived from the stored fields, never stored itself:
/// see [`Order::state`].
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: EntityId,
    pub customer_id: EntityId,
    /// The order picker working this order.
    pub employee_id: Option<EntityId>,
    pub date_ordered: Option<DateTime<Utc>>,
    pub date_completed: Option<DateTime<Utc>>,
    pub canceled: bool,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub id: EntityId,
    pub order_id: EntityId,
    pub variety_id: EntityId,
    pub pounds: Pounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    /// The customer's cart.
    Draft,
    Submitted,
    /// Submitted with a picker attached.
    Assigned,
    Completed,
    Canceled,
}

impl OrderState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Completed | OrderState::Canceled)
    }
}

impl Order {
    pub fn state(&self) -> OrderState {
        if self.canceled {
            OrderState::Canceled
        } else if self.date_completed.is_some() {
            OrderState::Completed
        } else if self.date_ordered.is_none() {
            OrderState::Draft
        } else if self.employee_id.is_some() {
            OrderState::Assigned
        } else {
            OrderState::Submitted
        }
    }

    pub fn is_draft(&self) -> bool {
        self.state() == OrderState::Draft
    }

    /// Not completed and not canceled.
    pub fn is_open(&self) -> bool {
        self.date_completed.is_none() && !self.canceled
    }

    pub fn is_open_assignment_of(&self, employee_id: EntityId) -> bool {
        self.employee_id == Some(employee_id) && self.is_open()
    }

    /// Submitted, still open, and waiting for a picker.
    pub fn is_unassigned(&self) -> bool {
        self.state() == OrderState::Submitted
    }

    pub fn item(&self, item_id: EntityId) -> Option<&OrderItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn item_mut(&mut self, item_id: EntityId) -> Option<&mut OrderItem> {
        self.items.iter_mut().find(|item| item.id == item_id)
    }

    pub fn take_item(&mut self, item_id: EntityId) -> Option<OrderItem> {
        let position = self.items.iter().position(|item| item.id == item_id)?;
        Some(self.items.remove(position))
    }
}

/// The two quantity edits a customer can make to a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoundsAdjustment {
    Increase,
    Decrease,
}

impl PoundsAdjustment {
    pub fn step() -> Pounds {
        Decimal::new(5, 1)
    }

    pub fn delta(&self) -> Pounds {
        match self {
            PoundsAdjustment::Increase => Self::step(),
            PoundsAdjustment::Decrease => -Self::step(),
        }
    }

    /// New quantity for a line, or `None` when the line should be dropped.
    ///
    /// Lines go away once they fall under one pound, even though the step is
    /// half a pound.
    /// The new quantity, or `None` when a decrease drops it below one pound
    /// and the item should be removed. Increases never remove.
    pub fn apply(&self, pounds: Pounds) -> Option<Pounds> {
        let adjusted = pounds + self.delta();
        match self {
            PoundsAdjustment::Increase => Some(adjusted),
            PoundsAdjustment::Decrease => (adjusted >= Decimal::ONE).then_some(adjusted),
        }
    }
}

/// What happened to a line after a quantity edit.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemAdjustment {
    Updated(OrderItem),
    Removed { order_id: EntityId, item_id: EntityId },
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lbs(tenths: i64) -> Pounds {
        Decimal::new(tenths, 1)
    }

    fn order() -> Order {
        Order {
            id: 1,
            customer_id: 9,
            employee_id: None,
            date_ordered: None,
            date_completed: None,
            canceled: false,
            items: Vec::new(),
        }
    }

    #[test]
    fn test_state_follows_stored_fields() {
        let mut order = order();
        assert_eq!(order.state(), OrderState::Draft);

        order.date_ordered = Some(Utc::now());
        assert_eq!(order.state(), OrderState::Submitted);
        assert!(order.is_unassigned());

        order.employee_id = Some(4);
        assert_eq!(order.state(), OrderState::Assigned);
        assert!(order.is_open_assignment_of(4));

        order.date_completed = Some(Utc::now());
        assert_eq!(order.state(), OrderState::Completed);
        assert!(order.state().is_terminal());
        assert!(!order.is_open_assignment_of(4));
    }

    #[test]
    fn test_canceled_wins_over_everything() {
        let mut order = order();
        order.date_ordered = Some(Utc::now());
        order.employee_id = Some(4);
        order.canceled = true;
        assert_eq!(order.state(), OrderState::Canceled);
        assert!(!order.is_open());
    }

    #[test]
    fn test_removal_threshold_is_one_pound() {
        assert_eq!(PoundsAdjustment::Decrease.apply(lbs(15)), Some(lbs(10)));
        assert_eq!(PoundsAdjustment::Decrease.apply(lbs(10)), None);
        assert_eq!(PoundsAdjustment::Increase.apply(lbs(5)), Some(lbs(10)));
    }

    #[test]
    fn test_increase_keeps_small_items() {
        let quarter = Decimal::new(25, 2);
        assert_eq!(PoundsAdjustment::Increase.apply(quarter), Some(Decimal::new(75, 2)));
        assert_eq!(PoundsAdjustment::Decrease.apply(Decimal::new(75, 2)), None);
    }

    proptest! {
        #[test]
        fn prop_adjustment_is_monotone(hundredths in 1i64..40_000) {
            let pounds = Decimal::new(hundredths, 2);
            let up = PoundsAdjustment::Increase.apply(pounds);
            let down = PoundsAdjustment::Decrease.apply(pounds);

            prop_assert_eq!(up, Some(pounds + PoundsAdjustment::step()));
            match down {
                Some(lower) => {
                    prop_assert!(lower >= Decimal::ONE);
                    prop_assert!(lower < pounds);
                }
                None => {
                    prop_assert!(pounds - PoundsAdjustment::step() < Decimal::ONE);
                }
            }
        }
    }
}
