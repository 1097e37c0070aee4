use serde::{Deserialize, Serialize};

use crate::db_types::{Amount, NewOrder, Order, OrderItem, OrderStatusType, UserId};

/// The facts about a payment that the processor vouched for in a verified notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub user_id: UserId,
    pub payment_reference: String,
    pub event_id: String,
    pub amount: Amount,
    pub currency: String,
    pub payment_method_type: String,
}

impl PaymentOutcome {
    pub fn to_new_order(&self, status: OrderStatusType) -> NewOrder {
        NewOrder {
            user_id: self.user_id.clone(),
            status,
            total_amount: self.amount,
            currency: self.currency.clone(),
            payment_method_type: self.payment_method_type.clone(),
            payment_reference: self.payment_reference.clone(),
            source_event_id: self.event_id.clone(),
        }
    }
}

/// An order together with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderWithItems {
    /// The sum of `price_at_purchase × quantity` over the items, or `None` if it overflows.
    pub fn items_total(&self) -> Option<Amount> {
        self.items.iter().map(OrderItem::line_total).try_fold(Amount::default(), |total, line| total.checked_add(line?))
    }

    /// True when the amount the processor charged equals the sum of the line items.
    pub fn amount_matches(&self) -> bool {
        self.items_total() == Some(self.order.total_amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterializeResult {
    /// The cart was converted into a new order and emptied.
    Created(OrderWithItems),
    /// A succeeded order already exists for this payment reference. Nothing was changed.
    AlreadyProcessed,
    /// The user's cart was empty, so no order was created.
    CartEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOrderResult {
    Inserted(OrderWithItems),
    AlreadyExists,
}
