//! Catalog row models.
//!
//! The catalog is read-mostly from the lifecycle's point of view: checkout
//! reads price/stock under row locks and decrements quantity; nothing here
//! creates or edits products.

use chrono::{DateTime, Utc};
use serde::Serialize;

use duka_core::{Amount, CategoryId, ProductId, VariationId};

/// A sellable item in the catalog.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub sku: String,
    pub brand: String,
    pub price: Amount,
    /// Available stock when the product has no variations.
    pub quantity: i32,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A specific variation of a product (e.g. Color=Red).
///
/// Variations carry their own price and stock; when present on a line item
/// they override the parent product's.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductVariation {
    pub id: VariationId,
    pub product_id: ProductId,
    pub name: String,
    pub value: String,
    pub sku: String,
    pub price: Amount,
    pub quantity: i32,
    pub in_stock: bool,
}
