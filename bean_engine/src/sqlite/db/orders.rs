use log::{debug, trace};
use sqlx::SqliteConnection;

use super::is_unique_violation;
use crate::{
    db_types::{CartItemDetail, NewOrder, Order, OrderItem, UserId},
    traits::FulfilmentError,
};

/// Inserts a new order using the given connection. This is not atomic. You can embed this call inside a transaction
/// if you need to ensure atomicity, and pass `&mut tx` as the connection argument.
///
/// Returns `None` if the insert collided with one of the idempotency indexes, i.e. a succeeded order already exists
/// for the payment reference, or this failure event has already been recorded.
pub async fn idempotent_insert(
    order: &NewOrder,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, FulfilmentError> {
    let result = sqlx::query_as::<_, Order>(
        r#"
            INSERT INTO orders (
                user_id,
                status,
                total_amount,
                currency,
                payment_method_type,
                payment_reference,
                source_event_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(order.user_id.as_str())
    .bind(order.status.to_string())
    .bind(order.total_amount.value())
    .bind(order.currency.as_str())
    .bind(order.payment_method_type.as_str())
    .bind(order.payment_reference.as_str())
    .bind(order.source_event_id.as_str())
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => {
            debug!("📝️ {} order #{} inserted for payment {}", order.status, order.id, order.payment_reference);
            Ok(Some(order))
        },
        Err(e) if is_unique_violation(&e) => {
            trace!("📝️ {} order for payment {} already exists", order.status, order.payment_reference);
            Ok(None)
        },
        Err(e) => Err(e.into()),
    }
}

/// Copies the cart lines into order items, using each bean's current price as the purchase price.
pub async fn insert_order_items(
    order_id: i64,
    lines: &[CartItemDetail],
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let item = sqlx::query_as(
            r#"
                INSERT INTO order_items (order_id, bean_id, price_at_purchase, quantity)
                VALUES ($1, $2, $3, $4)
                RETURNING *;
            "#,
        )
        .bind(order_id)
        .bind(line.bean_id)
        .bind(line.price.value())
        .bind(line.quantity)
        .fetch_one(&mut *conn)
        .await?;
        items.push(item);
    }
    trace!("📝️ {} items added to order #{order_id}", items.len());
    Ok(items)
}

pub async fn fetch_succeeded_order(
    payment_reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE payment_reference = $1 AND status = 'succeeded'")
        .bind(payment_reference)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_orders_for_user(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(user_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

pub async fn order_exists(order_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE id = $1").bind(order_id).fetch_one(conn).await?;
    Ok(count > 0)
}
