use thiserror::Error;

use crate::db_types::{CartItem, CartItemDetail, UserId};

/// The largest quantity a single cart line may hold, including merged additions.
pub const MAX_ITEM_QUANTITY: i64 = 10_000;

#[derive(Debug, Clone, Error)]
pub enum CartError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Bean #{0} does not exist")]
    BeanNotFound(i64),
    #[error("Cart item #{0} does not exist")]
    CartItemNotFound(i64),
    #[error("Quantity must be a positive number, but was {0}")]
    InvalidQuantity(i64),
    #[error("A cart line cannot hold more than {MAX_ITEM_QUANTITY} of a bean")]
    QuantityLimitExceeded,
    #[error("The cart is empty")]
    EmptyCart,
    #[error("The cart total is too large to be charged")]
    TotalOverflow,
}

/// Checks that `quantity` is a valid quantity for a single cart line.
pub fn validate_quantity(quantity: i64) -> Result<(), CartError> {
    match quantity {
        q if q <= 0 => Err(CartError::InvalidQuantity(q)),
        q if q > MAX_ITEM_QUANTITY => Err(CartError::QuantityLimitExceeded),
        _ => Ok(()),
    }
}

impl From<sqlx::Error> for CartError {
    fn from(e: sqlx::Error) -> Self {
        CartError::DatabaseError(e.to_string())
    }
}

/// Server-side shopping carts.
///
/// Every user has at most one cart, and a cart has at most one line per bean. Every method takes the identity of the
/// caller explicitly, and mutations of individual lines only ever touch lines in the caller's own cart.
#[allow(async_fn_in_trait)]
pub trait CartManagement {
    /// Adds `quantity` of `bean_id` to the user's cart, creating the cart if necessary.
    ///
    /// If the bean is already in the cart, the quantities are merged rather than a second line being added. This is
    /// safe under concurrent calls for the same user and bean. A merge that would take the line past
    /// [`MAX_ITEM_QUANTITY`] fails with [`CartError::QuantityLimitExceeded`] and leaves the line untouched.
    async fn add_or_merge_item(&self, user_id: &UserId, bean_id: i64, quantity: i64) -> Result<CartItem, CartError>;

    /// The lines in the user's cart, joined with the current catalog details, newest first.
    /// A user without a cart simply has no items.
    async fn fetch_cart_items(&self, user_id: &UserId) -> Result<Vec<CartItemDetail>, CartError>;

    /// Overwrites the quantity of a line in the user's own cart.
    async fn set_item_quantity(&self, item_id: i64, user_id: &UserId, quantity: i64) -> Result<CartItem, CartError>;

    /// Deletes a line from the user's own cart.
    async fn remove_item(&self, item_id: i64, user_id: &UserId) -> Result<(), CartError>;
}
