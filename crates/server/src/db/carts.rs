//! Database operations for carts and cart items.
//!
//! A user has at most one open cart (`checked_out = false`) at a time. The
//! open cart is created lazily on the first item add, and each (product,
//! variation) pair appears at most once per cart; re-adding increments the
//! existing row's quantity.

use sqlx::{PgConnection, PgPool};

use duka_core::{Amount, CartId, CartItemId, ProductId, UserId, VariationId};

use super::RepositoryError;
use crate::models::{Cart, CartItem};

const CART_COLUMNS: &str = "id, user_id, checked_out, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, cart_id, product_id, variation_id, quantity, price";

/// Get the user's open cart, if any.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn open_cart(pool: &PgPool, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
    let cart = sqlx::query_as::<_, Cart>(&format!(
        "SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1 AND NOT checked_out"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(cart)
}

/// Get the user's open cart, creating one if none exists.
///
/// Relies on the partial unique index on `(user_id) WHERE NOT checked_out`:
/// a concurrent create loses the insert race and picks up the winner's row.
///
/// # Errors
///
/// Returns error if the database operations fail.
pub async fn get_or_create_open_cart(
    pool: &PgPool,
    user_id: UserId,
) -> Result<Cart, RepositoryError> {
    let inserted = sqlx::query_as::<_, Cart>(&format!(
        r"
        INSERT INTO carts (user_id)
        VALUES ($1)
        ON CONFLICT (user_id) WHERE NOT checked_out DO NOTHING
        RETURNING {CART_COLUMNS}
        "
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    if let Some(cart) = inserted {
        return Ok(cart);
    }

    open_cart(pool, user_id).await?.ok_or_else(|| {
        RepositoryError::DataCorruption(format!("open cart for user {user_id} vanished"))
    })
}

/// Lock and fetch a user's cart for checkout.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn lock_for_checkout(
    conn: &mut PgConnection,
    cart_id: CartId,
    user_id: UserId,
) -> Result<Option<Cart>, RepositoryError> {
    let cart = sqlx::query_as::<_, Cart>(&format!(
        "SELECT {CART_COLUMNS} FROM carts WHERE id = $1 AND user_id = $2 FOR UPDATE"
    ))
    .bind(cart_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;

    Ok(cart)
}

/// List the items in a cart.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn items(pool: &PgPool, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError> {
    let items = sqlx::query_as::<_, CartItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM cart_items WHERE cart_id = $1 ORDER BY id"
    ))
    .bind(cart_id)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

/// List the items in a cart from within a transaction.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn items_in_tx(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<Vec<CartItem>, RepositoryError> {
    let items = sqlx::query_as::<_, CartItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM cart_items WHERE cart_id = $1 ORDER BY id"
    ))
    .bind(cart_id)
    .fetch_all(conn)
    .await?;

    Ok(items)
}

/// Add an item to a cart, or bump the quantity of the existing row for the
/// same (product, variation) pair.
///
/// `price` is the add-time snapshot; the upsert leaves an existing row's
/// snapshot untouched.
///
/// # Errors
///
/// Returns error if the database operation fails.
pub async fn upsert_item(
    pool: &PgPool,
    cart_id: CartId,
    product_id: ProductId,
    variation_id: Option<VariationId>,
    quantity: i32,
    price: Amount,
) -> Result<CartItem, RepositoryError> {
    let item = sqlx::query_as::<_, CartItem>(&format!(
        r"
        INSERT INTO cart_items (cart_id, product_id, variation_id, quantity, price)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (cart_id, product_id, variation_id)
        DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
        RETURNING {ITEM_COLUMNS}
        "
    ))
    .bind(cart_id)
    .bind(product_id)
    .bind(variation_id)
    .bind(quantity)
    .bind(price)
    .fetch_one(pool)
    .await?;

    touch(pool, cart_id).await?;
    Ok(item)
}

/// Get an item by id if it sits in the user's open cart.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn item_in_open_cart(
    pool: &PgPool,
    item_id: CartItemId,
    user_id: UserId,
) -> Result<Option<CartItem>, RepositoryError> {
    let item = sqlx::query_as::<_, CartItem>(
        r"
        SELECT i.id, i.cart_id, i.product_id, i.variation_id, i.quantity, i.price
        FROM cart_items i
        JOIN carts c ON c.id = i.cart_id
        WHERE i.id = $1 AND c.user_id = $2 AND NOT c.checked_out
        ",
    )
    .bind(item_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(item)
}

/// Set an item's quantity.
///
/// # Errors
///
/// Returns error if the database operation fails.
pub async fn set_item_quantity(
    pool: &PgPool,
    item_id: CartItemId,
    quantity: i32,
) -> Result<CartItem, RepositoryError> {
    let item = sqlx::query_as::<_, CartItem>(&format!(
        "UPDATE cart_items SET quantity = $2 WHERE id = $1 RETURNING {ITEM_COLUMNS}"
    ))
    .bind(item_id)
    .bind(quantity)
    .fetch_one(pool)
    .await?;

    touch(pool, item.cart_id).await?;
    Ok(item)
}

/// Delete an item.
///
/// # Errors
///
/// Returns error if the database operation fails.
pub async fn delete_item(pool: &PgPool, item: &CartItem) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM cart_items WHERE id = $1")
        .bind(item.id)
        .execute(pool)
        .await?;

    touch(pool, item.cart_id).await?;
    Ok(())
}

/// Mark a cart as checked out. Part of the checkout transaction.
///
/// # Errors
///
/// Returns error if the database operation fails.
pub async fn mark_checked_out(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE carts SET checked_out = true, updated_at = now() WHERE id = $1",
    )
    .bind(cart_id)
    .execute(conn)
    .await?;

    Ok(())
}

/// Bump a cart's `updated_at`.
async fn touch(pool: &PgPool, cart_id: CartId) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE carts SET updated_at = now() WHERE id = $1")
        .bind(cart_id)
        .execute(pool)
        .await?;

    Ok(())
}
