//! Database operations for the catalog (products and variations).
//!
//! The lifecycle core only reads price/stock and decrements quantities; all
//! other catalog management happens outside this service. The `lock_*`
//! functions take a transaction connection and acquire row locks so that
//! concurrent checkouts serialize on stock decrement.

use sqlx::{PgConnection, PgPool};

use duka_core::{ProductId, VariationId};

use super::RepositoryError;
use crate::models::{Product, ProductVariation};

const PRODUCT_COLUMNS: &str = "id, category_id, name, slug, description, sku, brand, \
                               price, quantity, in_stock, created_at, updated_at";

const VARIATION_COLUMNS: &str = "id, product_id, name, value, sku, price, quantity, in_stock";

/// Get a product by id.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn get_product(
    pool: &PgPool,
    id: ProductId,
) -> Result<Option<Product>, RepositoryError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

/// Get a variation by id, constrained to its parent product.
///
/// The constraint rejects line items that pair a variation with a product it
/// does not belong to.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn get_variation_of(
    pool: &PgPool,
    id: VariationId,
    product_id: ProductId,
) -> Result<Option<ProductVariation>, RepositoryError> {
    let variation = sqlx::query_as::<_, ProductVariation>(&format!(
        "SELECT {VARIATION_COLUMNS} FROM product_variations WHERE id = $1 AND product_id = $2"
    ))
    .bind(id)
    .bind(product_id)
    .fetch_optional(pool)
    .await?;

    Ok(variation)
}

/// Lock and fetch a product row for update.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn lock_product(
    conn: &mut PgConnection,
    id: ProductId,
) -> Result<Option<Product>, RepositoryError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(product)
}

/// Lock and fetch a variation row for update.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn lock_variation(
    conn: &mut PgConnection,
    id: VariationId,
) -> Result<Option<ProductVariation>, RepositoryError> {
    let variation = sqlx::query_as::<_, ProductVariation>(&format!(
        "SELECT {VARIATION_COLUMNS} FROM product_variations WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(variation)
}

/// Decrement a product's stock, flipping `in_stock` off at zero.
///
/// The quantity predicate is a second line of defense behind the row lock:
/// the statement refuses to drive stock negative even if the caller's check
/// was stale.
///
/// # Errors
///
/// Returns [`RepositoryError::Conflict`] if the product no longer has
/// `quantity` units.
pub async fn decrement_product_stock(
    conn: &mut PgConnection,
    id: ProductId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE products
        SET quantity = quantity - $2,
            in_stock = quantity - $2 > 0,
            updated_at = now()
        WHERE id = $1 AND quantity >= $2
        ",
    )
    .bind(id)
    .bind(quantity)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::Conflict(format!(
            "stock underflow for product {id}"
        )));
    }
    Ok(())
}

/// Decrement a variation's stock, flipping `in_stock` off at zero.
///
/// # Errors
///
/// Returns [`RepositoryError::Conflict`] if the variation no longer has
/// `quantity` units.
pub async fn decrement_variation_stock(
    conn: &mut PgConnection,
    id: VariationId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE product_variations
        SET quantity = quantity - $2,
            in_stock = quantity - $2 > 0
        WHERE id = $1 AND quantity >= $2
        ",
    )
    .bind(id)
    .bind(quantity)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::Conflict(format!(
            "stock underflow for variation {id}"
        )));
    }
    Ok(())
}

/// Rows repaired by one stock-flag sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockReconciliation {
    pub products: u64,
    pub variations: u64,
}

impl StockReconciliation {
    /// True when the sweep found nothing to repair.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.products == 0 && self.variations == 0
    }
}

/// Reconcile `in_stock` flags with quantities across the catalog.
///
/// Used by the periodic stock maintenance sweep. A product counts as in
/// stock when it has own quantity or at least one in-stock variation. Both
/// statements are single atomic UPDATEs, safe to run concurrently with
/// checkout.
///
/// # Errors
///
/// Returns error if either update fails.
pub async fn reconcile_stock_flags(pool: &PgPool) -> Result<StockReconciliation, RepositoryError> {
    let variations = sqlx::query(
        r"
        UPDATE product_variations
        SET in_stock = quantity > 0
        WHERE in_stock <> (quantity > 0)
        ",
    )
    .execute(pool)
    .await?
    .rows_affected();

    let products = sqlx::query(
        r"
        UPDATE products p
        SET in_stock = availability.has_stock,
            updated_at = now()
        FROM (
            SELECT p2.id,
                   p2.quantity > 0 OR EXISTS (
                       SELECT 1 FROM product_variations v
                       WHERE v.product_id = p2.id AND v.in_stock
                   ) AS has_stock
            FROM products p2
        ) AS availability
        WHERE p.id = availability.id AND p.in_stock <> availability.has_stock
        ",
    )
    .execute(pool)
    .await?
    .rows_affected();

    Ok(StockReconciliation {
        products,
        variations,
    })
}
