use thiserror::Error;

use crate::{
    db_types::{Order, OrderItem, UserId},
    traits::data_objects::{InsertOrderResult, MaterializeResult, PaymentOutcome},
};

#[derive(Debug, Clone, Error)]
pub enum FulfilmentError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order #{0} does not exist")]
    OrderNotFound(i64),
}

impl From<sqlx::Error> for FulfilmentError {
    fn from(e: sqlx::Error) -> Self {
        FulfilmentError::DatabaseError(e.to_string())
    }
}

/// Read access to orders.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// The succeeded order for the given payment reference, if the payment has been fulfilled.
    async fn fetch_succeeded_order(&self, payment_reference: &str) -> Result<Option<Order>, FulfilmentError>;

    /// All orders, successful or not, for the user. Newest first.
    async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, FulfilmentError>;

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, FulfilmentError>;
}

/// Backends that can turn payment outcomes into orders.
///
/// Both flows are driven by notifications that may arrive more than once, and possibly concurrently. Implementations
/// must detect repeats using storage constraints inside the same atomic unit that performs the write, rather than
/// checking for an existing order first.
#[allow(async_fn_in_trait)]
pub trait FulfilmentDatabase: Clone + OrderManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// In a single atomic transaction:
    /// * stores a `succeeded` order for the payment. If one already exists for the payment reference, nothing further
    ///   is done and [`MaterializeResult::AlreadyProcessed`] is returned.
    /// * copies every line in the user's cart into an order item, snapshotting the bean's current price.
    /// * empties the cart.
    ///
    /// If the cart is empty, the transaction is rolled back and [`MaterializeResult::CartEmpty`] is returned.
    /// The order total is always the amount in `payment`, even if it differs from the sum of the items.
    async fn materialize_order(&self, payment: &PaymentOutcome) -> Result<MaterializeResult, FulfilmentError>;

    /// Stores a `failed` order for auditing, with the user's current cart lines as items. The cart is not modified.
    ///
    /// Redelivery of the same notification returns [`InsertOrderResult::AlreadyExists`].
    async fn record_failed_order(&self, payment: &PaymentOutcome) -> Result<InsertOrderResult, FulfilmentError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), FulfilmentError> {
        Ok(())
    }
}
