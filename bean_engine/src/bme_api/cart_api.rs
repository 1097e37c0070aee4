use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Amount, CartItem, CartItemDetail, UserId},
    traits::{validate_quantity, CartError, CartManagement},
};

/// `CartApi` manages users' carts.
pub struct CartApi<B> {
    db: B,
}

impl<B: Debug> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi ({:?})", self.db)
    }
}

impl<B> CartApi<B>
where B: CartManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Adds `quantity` of a bean to the user's cart. Adding a bean that is already in the cart increases the quantity
    /// of the existing line.
    pub async fn add_item(&self, user_id: &UserId, bean_id: i64, quantity: i64) -> Result<CartItem, CartError> {
        validate_quantity(quantity)?;
        let item = self.db.add_or_merge_item(user_id, bean_id, quantity).await?;
        trace!("🛒️ {} added {quantity} of bean #{bean_id} to their cart", user_id.short());
        Ok(item)
    }

    pub async fn cart_items(&self, user_id: &UserId) -> Result<Vec<CartItemDetail>, CartError> {
        self.db.fetch_cart_items(user_id).await
    }

    pub async fn set_quantity(&self, user_id: &UserId, item_id: i64, quantity: i64) -> Result<CartItem, CartError> {
        validate_quantity(quantity)?;
        self.db.set_item_quantity(item_id, user_id, quantity).await
    }

    pub async fn remove_item(&self, user_id: &UserId, item_id: i64) -> Result<(), CartError> {
        self.db.remove_item(item_id, user_id).await?;
        trace!("🛒️ {} removed cart item #{item_id}", user_id.short());
        Ok(())
    }

    /// The amount to charge for the user's cart at current prices.
    ///
    /// This is the amount the payment intent is created for. The amount that is eventually recorded on the order is
    /// whatever the processor reports as charged.
    pub async fn checkout_total(&self, user_id: &UserId) -> Result<Amount, CartError> {
        let items = self.db.fetch_cart_items(user_id).await?;
        if items.is_empty() {
            return Err(CartError::EmptyCart);
        }
        let lines = items.iter().map(CartItemDetail::line_total).collect::<Option<Vec<Amount>>>();
        let total = lines.and_then(Amount::checked_sum).ok_or(CartError::TotalOverflow)?;
        debug!("🛒️ Checkout total for {} is {total} ({} lines)", user_id.short(), items.len());
        Ok(total)
    }
}
