//! Database operations for orders and order items.

use sqlx::{PgConnection, PgPool};

use duka_core::{Amount, OrderId, OrderStatus, ProductId, UserId, VariationId};

use super::RepositoryError;
use crate::models::{Order, OrderItem};

const ORDER_COLUMNS: &str = "id, user_id, total_amount, address, phone_number, \
                             payment_method, status, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, variation_id, quantity, price";

/// A line to insert when creating an order. Quantity and price are the
/// checkout-time snapshot.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub variation_id: Option<VariationId>,
    pub quantity: i32,
    pub price: Amount,
}

/// Insert an order. Part of the checkout transaction.
///
/// # Errors
///
/// Returns error if the database operation fails.
pub async fn insert_order(
    conn: &mut PgConnection,
    user_id: UserId,
    total_amount: Amount,
    address: &str,
    phone_number: &str,
    payment_method: &str,
) -> Result<Order, RepositoryError> {
    let order = sqlx::query_as::<_, Order>(&format!(
        r"
        INSERT INTO orders (user_id, total_amount, address, phone_number, payment_method)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(user_id)
    .bind(total_amount)
    .bind(address)
    .bind(phone_number)
    .bind(payment_method)
    .fetch_one(conn)
    .await?;

    Ok(order)
}

/// Insert the order's line items. Part of the checkout transaction.
///
/// # Errors
///
/// Returns error if the database operation fails.
pub async fn insert_order_items(
    conn: &mut PgConnection,
    order_id: OrderId,
    lines: &[NewOrderItem],
) -> Result<Vec<OrderItem>, RepositoryError> {
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let item = sqlx::query_as::<_, OrderItem>(&format!(
            r"
            INSERT INTO order_items (order_id, product_id, variation_id, quantity, price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(order_id)
        .bind(line.product_id)
        .bind(line.variation_id)
        .bind(line.quantity)
        .bind(line.price)
        .fetch_one(&mut *conn)
        .await?;
        items.push(item);
    }

    Ok(items)
}

/// Get an order by id if it belongs to the user.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn get_for_user(
    pool: &PgPool,
    order_id: OrderId,
    user_id: UserId,
) -> Result<Option<Order>, RepositoryError> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
    ))
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(order)
}

/// List a user's orders, newest first.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn list_for_user(
    pool: &PgPool,
    user_id: UserId,
) -> Result<Vec<Order>, RepositoryError> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(orders)
}

/// List an order's items.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn items(pool: &PgPool, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
    let items = sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
    ))
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

/// Move an order's status, guarded by the expected current status.
///
/// The predicate makes the write a compare-and-set: a concurrent transition
/// wins and this call reports `false` instead of clobbering it.
///
/// # Errors
///
/// Returns error if the database operation fails.
pub async fn transition_status(
    pool: &PgPool,
    order_id: OrderId,
    from: OrderStatus,
    to: OrderStatus,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "UPDATE orders SET status = $3, updated_at = now() WHERE id = $1 AND status = $2",
    )
    .bind(order_id)
    .bind(from)
    .bind(to)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Get the current status of an order.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn status(
    pool: &PgPool,
    order_id: OrderId,
) -> Result<Option<OrderStatus>, RepositoryError> {
    let row: Option<(OrderStatus,)> =
        sqlx::query_as("SELECT status FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(status,)| status))
}
