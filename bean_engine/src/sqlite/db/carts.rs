use log::{debug, trace};
use sqlx::SqliteConnection;

use super::is_foreign_key_violation;
use crate::{
    db_types::{CartItem, CartItemDetail, UserId},
    traits::CartError,
};

/// Returns the id of the user's cart, creating the cart if it does not exist yet.
///
/// This always starts with an `INSERT`, so it is safe to call as the first statement in a write transaction.
pub async fn fetch_or_create_cart_id(user_id: &UserId, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let created = sqlx::query("INSERT INTO carts (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id.as_str())
        .execute(&mut *conn)
        .await?
        .rows_affected();
    if created > 0 {
        trace!("🛒️ New cart created for {}", user_id.short());
    }
    let id =
        sqlx::query_scalar("SELECT id FROM carts WHERE user_id = $1").bind(user_id.as_str()).fetch_one(conn).await?;
    Ok(id)
}

/// Inserts a new line, or adds `quantity` to the existing line for the same bean. The merged quantity may not exceed
/// `max_quantity`.
pub async fn upsert_item(
    cart_id: i64,
    bean_id: i64,
    quantity: i64,
    max_quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartItem, CartError> {
    let item: Option<CartItem> = sqlx::query_as(
        r#"
            INSERT INTO cart_items (cart_id, bean_id, quantity) VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, bean_id) DO UPDATE SET
                quantity = cart_items.quantity + excluded.quantity,
                updated_at = CURRENT_TIMESTAMP
            WHERE cart_items.quantity + excluded.quantity <= $4
            RETURNING *;
        "#,
    )
    .bind(cart_id)
    .bind(bean_id)
    .bind(quantity)
    .bind(max_quantity)
    .fetch_optional(conn)
    .await
    .map_err(|e| if is_foreign_key_violation(&e) { CartError::BeanNotFound(bean_id) } else { CartError::from(e) })?;
    let item = item.ok_or(CartError::QuantityLimitExceeded)?;
    debug!("🛒️ Cart #{cart_id} now holds {} of bean #{bean_id}", item.quantity);
    Ok(item)
}

/// The lines of the user's cart joined with the catalog. Newest first.
pub async fn fetch_cart_items(
    user_id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Vec<CartItemDetail>, sqlx::Error> {
    let items = sqlx::query_as(
        r#"
            SELECT
                cart_items.id,
                cart_items.bean_id,
                beans.name,
                beans.price,
                cart_items.quantity,
                beans.process,
                beans.roast_profile
            FROM cart_items
                JOIN carts ON carts.id = cart_items.cart_id
                JOIN beans ON beans.id = cart_items.bean_id
            WHERE carts.user_id = $1
            ORDER BY cart_items.created_at DESC, cart_items.id DESC;
        "#,
    )
    .bind(user_id.as_str())
    .fetch_all(conn)
    .await?;
    Ok(items)
}

/// Sets the quantity of a line, but only if the line lives in `user_id`'s cart.
pub async fn update_item_quantity(
    item_id: i64,
    user_id: &UserId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartItem>, sqlx::Error> {
    let item = sqlx::query_as(
        r#"
            UPDATE cart_items SET quantity = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND cart_id IN (SELECT id FROM carts WHERE user_id = $3)
            RETURNING *;
        "#,
    )
    .bind(quantity)
    .bind(item_id)
    .bind(user_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(item)
}

/// Deletes a line, but only if it lives in `user_id`'s cart. Returns the number of rows deleted.
pub async fn delete_item(item_id: i64, user_id: &UserId, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM cart_items WHERE id = $1 AND cart_id IN (SELECT id FROM carts WHERE user_id = $2)",
    )
    .bind(item_id)
    .bind(user_id.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Removes every line from the user's cart. The (now empty) cart itself is kept.
pub async fn clear_cart(user_id: &UserId, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id IN (SELECT id FROM carts WHERE user_id = $1)")
        .bind(user_id.as_str())
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
